//! Family use-case service.
//!
//! # Responsibility
//! - Own the in-memory `FamilyStore` loaded from a repository.
//! - Persist the full snapshot after every mutation that changed state.
//! - Serve layout and forest projections with the configured geometry.
//!
//! # Invariants
//! - A failed save never rolls back or alters in-memory state; the error is
//!   logged and kept in `last_persist_error` until the next successful save.
//! - No-op mutations (unknown id, existing edge) do not touch the repository.

use crate::config::LayoutConfig;
use crate::events::FamilyCommand;
use crate::layout::{compute_layout, descendant_forest, FamilyLayout, LayoutRequest, TreeNode};
use crate::model::person::{Person, PersonDraft, PersonId, PersonPatch};
use crate::model::relationship::RelationshipKind;
use crate::repo::{FamilyRepository, RepoError};
use crate::store::family_store::{EdgeChange, FamilyStore, StoreError};
use crate::store::invariants::LoadReport;
use log::{error, info};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for family use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Store rejected the operation; nothing changed.
    Store(StoreError),
    /// Loading or an explicit flush failed.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of [`FamilyService::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Person after an add or update.
    Person(Person),
    Deleted(Person),
    Edge(EdgeChange),
    /// Whether `RemoveRelationship` removed anything.
    Unlinked(bool),
    /// Collapsed flag after the command.
    Collapsed(bool),
}

/// Store + repository facade.
pub struct FamilyService<R: FamilyRepository> {
    repo: R,
    store: FamilyStore,
    layout_config: LayoutConfig,
    load_report: LoadReport,
    last_persist_error: Option<RepoError>,
}

impl<R: FamilyRepository> FamilyService<R> {
    /// Loads the snapshot from `repo`, repairing broken invariants in memory.
    pub fn open(repo: R, layout_config: LayoutConfig) -> ServiceResult<Self> {
        let started_at = Instant::now();
        let people = repo.load_people().map_err(|err| {
            error!("event=service_open module=service status=error error={err}");
            err
        })?;
        let (store, load_report) = FamilyStore::load(people);
        info!(
            "event=service_open module=service status=ok people={} repairs={} duration_ms={}",
            store.len(),
            load_report.repairs(),
            started_at.elapsed().as_millis()
        );
        Ok(Self {
            repo,
            store,
            layout_config,
            load_report,
            last_persist_error: None,
        })
    }

    pub fn store(&self) -> &FamilyStore {
        &self.store
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    /// Repairs applied while loading the snapshot.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    /// Most recent save failure, cleared by the next successful save.
    pub fn last_persist_error(&self) -> Option<&RepoError> {
        self.last_persist_error.as_ref()
    }

    pub fn get_person(&self, id: &PersonId) -> Option<&Person> {
        self.store.get_person(id)
    }

    pub fn add_person(&mut self, draft: PersonDraft) -> Person {
        let person = self.store.add_person(draft).clone();
        self.persist("add_person");
        person
    }

    pub fn update_person(&mut self, id: &PersonId, patch: &PersonPatch) -> ServiceResult<Person> {
        let person = self.store.update_person(id, patch)?.clone();
        if !patch.is_empty() {
            self.persist("update_person");
        }
        Ok(person)
    }

    pub fn delete_person(&mut self, id: &PersonId) -> ServiceResult<Person> {
        let removed = self.store.delete_person(id)?;
        self.persist("delete_person");
        Ok(removed)
    }

    pub fn add_relationship(
        &mut self,
        a: &PersonId,
        b: &PersonId,
        kind: RelationshipKind,
    ) -> ServiceResult<EdgeChange> {
        let change = self.store.add_relationship(a, b, kind)?;
        if change.is_added() {
            self.persist("add_relationship");
        }
        Ok(change)
    }

    pub fn remove_relationship(&mut self, a: &PersonId, b: &PersonId) -> ServiceResult<bool> {
        let removed = self.store.remove_relationship(a, b)?;
        if removed {
            self.persist("remove_relationship");
        }
        Ok(removed)
    }

    pub fn set_collapsed(&mut self, id: &PersonId, collapsed: bool) -> ServiceResult<()> {
        let before = self.store.get_person(id).map(Person::is_collapsed);
        self.store.set_collapsed(id, collapsed)?;
        if before != Some(collapsed) {
            self.persist("set_collapsed");
        }
        Ok(())
    }

    pub fn toggle_collapsed(&mut self, id: &PersonId) -> ServiceResult<bool> {
        let collapsed = self.store.toggle_collapsed(id)?;
        self.persist("toggle_collapsed");
        Ok(collapsed)
    }

    /// Replaces every person with `people`, repaired like a load.
    pub fn replace_all(&mut self, people: Vec<Person>) -> LoadReport {
        let (store, report) = FamilyStore::load(people);
        self.store = store;
        self.persist("replace_all");
        report
    }

    /// Applies one command and persists when it changed state.
    pub fn execute(&mut self, command: FamilyCommand) -> ServiceResult<CommandOutcome> {
        let name = command.name();
        let outcome = match command {
            FamilyCommand::AddPerson(draft) => CommandOutcome::Person(self.add_person(draft)),
            FamilyCommand::UpdatePerson { id, patch } => {
                CommandOutcome::Person(self.update_person(&id, &patch)?)
            }
            FamilyCommand::DeletePerson(id) => CommandOutcome::Deleted(self.delete_person(&id)?),
            FamilyCommand::AddRelationship { a, b, kind } => {
                CommandOutcome::Edge(self.add_relationship(&a, &b, kind)?)
            }
            FamilyCommand::RemoveRelationship { a, b } => {
                CommandOutcome::Unlinked(self.remove_relationship(&a, &b)?)
            }
            FamilyCommand::SetCollapsed { id, collapsed } => {
                self.set_collapsed(&id, collapsed)?;
                CommandOutcome::Collapsed(collapsed)
            }
            FamilyCommand::ToggleCollapsed(id) => {
                CommandOutcome::Collapsed(self.toggle_collapsed(&id)?)
            }
        };
        info!("event=command_execute module=service status=ok command={name}");
        Ok(outcome)
    }

    /// Layout with the configured geometry, optionally rooted at `focus`.
    pub fn layout(&self, focus: Option<PersonId>) -> FamilyLayout {
        self.layout_with(&LayoutRequest {
            focus,
            collapsed: BTreeSet::new(),
        })
    }

    pub fn layout_with(&self, request: &LayoutRequest) -> FamilyLayout {
        compute_layout(self.store.people(), request, &self.layout_config)
    }

    pub fn descendant_forest(&self) -> Vec<TreeNode> {
        descendant_forest(self.store.people(), &BTreeSet::new())
    }

    /// Saves the current snapshot and reports failure to the caller.
    pub fn flush(&mut self) -> ServiceResult<()> {
        match self.repo.save_people(self.store.people()) {
            Ok(()) => {
                self.last_persist_error = None;
                Ok(())
            }
            Err(err) => {
                error!("event=service_flush module=service status=error error={err}");
                Err(ServiceError::Repo(err))
            }
        }
    }

    fn persist(&mut self, operation: &'static str) {
        match self.repo.save_people(self.store.people()) {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                error!(
                    "event=persist module=service status=error op={} people={} error={}",
                    operation,
                    self.store.len(),
                    err
                );
                self.last_persist_error = Some(err);
            }
        }
    }
}
