//! Relationship store over an ordered set of people.
//!
//! # Responsibility
//! - Provide create/update/delete/query APIs for people.
//! - Keep parent/child and spouse edges symmetric on every mutation.
//!
//! # Invariants
//! - `people` keeps insertion order; `index` maps every id to its position.
//! - Both endpoints of an edge are resolved before either side is written,
//!   so no operation can leave a half-applied edge.
//! - Every operation is total: bad input degrades to an `Err` diagnostic with
//!   the store left unchanged.

use crate::model::person::{Person, PersonDraft, PersonId, PersonPatch};
use crate::model::relationship::{RelationList, RelationshipKind};
use crate::store::invariants::{check_invariants, normalize_people, InvariantViolation, LoadReport};
use log::{debug, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Diagnostic for an operation that degraded to a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced person does not exist.
    NotFound(PersonId),
    /// Relationship request targets the same person on both ends.
    InvalidEdge(PersonId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::InvalidEdge(id) => {
                write!(f, "relationship cannot connect a person to itself: {id}")
            }
        }
    }
}

impl Error for StoreError {}

/// Outcome of a successful `add_relationship`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    /// At least one side was written.
    Added,
    /// Both sides already held the edge.
    AlreadyPresent,
}

impl EdgeChange {
    pub fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Resolved relatives of one person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedPeople<'a> {
    pub parents: Vec<&'a Person>,
    pub spouses: Vec<&'a Person>,
    pub children: Vec<&'a Person>,
}

/// Single source of truth for people and their relationships.
#[derive(Debug, Clone, Default)]
pub struct FamilyStore {
    people: Vec<Person>,
    index: HashMap<PersonId, usize>,
}

impl FamilyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from an external snapshot, repairing broken invariants.
    pub fn load(people: Vec<Person>) -> (Self, LoadReport) {
        let (people, report) = normalize_people(people);
        if !report.is_clean() {
            warn!(
                "event=store_load module=store status=repaired people={} repairs={} mirrors_added={} dangling_dropped={} duplicates_dropped={}",
                report.people,
                report.repairs(),
                report.mirrors_added,
                report.dangling_references_dropped,
                report.duplicate_edges_dropped + report.duplicate_people_dropped
            );
        }
        let mut store = Self {
            people,
            index: HashMap::new(),
        };
        store.rebuild_index();
        (store, report)
    }

    /// Same as [`FamilyStore::load`], discarding the repair report.
    pub fn from_people(people: Vec<Person>) -> Self {
        Self::load(people).0
    }

    /// People in insertion order.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn into_people(self) -> Vec<Person> {
        self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_person(&self, id: &PersonId) -> Option<&Person> {
        self.index.get(id).map(|&position| &self.people[position])
    }

    /// Creates a person with a fresh id and empty relationship lists.
    pub fn add_person(&mut self, draft: PersonDraft) -> &Person {
        let person = Person::new(draft);
        let position = self.people.len();
        self.index.insert(person.id.clone(), position);
        self.people.push(person);
        debug!(
            "event=person_add module=store status=ok people={}",
            self.people.len()
        );
        &self.people[position]
    }

    /// Merges `patch` into an existing person. Relationship lists are never
    /// touched by this path.
    pub fn update_person(&mut self, id: &PersonId, patch: &PersonPatch) -> StoreResult<&Person> {
        let position = self.position(id)?;
        patch.apply_to(&mut self.people[position]);
        Ok(&self.people[position])
    }

    pub fn set_collapsed(&mut self, id: &PersonId, collapsed: bool) -> StoreResult<()> {
        let position = self.position(id)?;
        self.people[position].ui.collapsed = collapsed;
        Ok(())
    }

    /// Flips the collapsed flag and returns the new value.
    pub fn toggle_collapsed(&mut self, id: &PersonId) -> StoreResult<bool> {
        let position = self.position(id)?;
        let person = &mut self.people[position];
        person.ui.collapsed = !person.ui.collapsed;
        Ok(person.ui.collapsed)
    }

    /// Removes a person and strips its id from every remaining relationship list.
    pub fn delete_person(&mut self, id: &PersonId) -> StoreResult<Person> {
        let position = self.position(id)?;
        let removed = self.people.remove(position);
        let mut stripped = 0usize;
        for person in &mut self.people {
            for list in RelationList::ALL {
                let ids = person.relation_ids_mut(list);
                let before = ids.len();
                ids.retain(|related| related != id);
                stripped += before - ids.len();
            }
        }
        self.rebuild_index();
        debug!(
            "event=person_delete module=store status=ok edges_stripped={} people={}",
            stripped,
            self.people.len()
        );
        Ok(removed)
    }

    /// Records "`a` is the `kind` of `b`" on both people.
    ///
    /// Each side is written only if it does not already hold the edge, so
    /// repeated calls are idempotent.
    pub fn add_relationship(
        &mut self,
        a: &PersonId,
        b: &PersonId,
        kind: RelationshipKind,
    ) -> StoreResult<EdgeChange> {
        if a == b {
            return Err(StoreError::InvalidEdge(a.clone()));
        }
        let position_a = self.position(a)?;
        let position_b = self.position(b)?;

        let list_on_a = match kind {
            RelationshipKind::Parent => RelationList::Children,
            RelationshipKind::Child => RelationList::Parents,
            RelationshipKind::Spouse => RelationList::Spouses,
        };
        let added_on_a = push_unique(self.people[position_a].relation_ids_mut(list_on_a), b);
        let added_on_b = push_unique(
            self.people[position_b].relation_ids_mut(list_on_a.mirror()),
            a,
        );

        let change = if added_on_a || added_on_b {
            EdgeChange::Added
        } else {
            EdgeChange::AlreadyPresent
        };
        debug!(
            "event=relationship_add module=store status=ok kind={} changed={}",
            kind.as_str(),
            change.is_added()
        );
        Ok(change)
    }

    /// Removes any relationship between `a` and `b`, whatever its kind.
    ///
    /// Returns whether anything was removed.
    pub fn remove_relationship(&mut self, a: &PersonId, b: &PersonId) -> StoreResult<bool> {
        if a == b {
            return Err(StoreError::InvalidEdge(a.clone()));
        }
        let position_a = self.position(a)?;
        let position_b = self.position(b)?;

        let removed_on_a = strip_all(&mut self.people[position_a], b);
        let removed_on_b = strip_all(&mut self.people[position_b], a);
        let removed = removed_on_a || removed_on_b;
        debug!(
            "event=relationship_remove module=store status=ok changed={}",
            removed
        );
        Ok(removed)
    }

    /// Case-insensitive substring match on first, last, nick and full name.
    ///
    /// Results keep insertion order. A blank query matches everyone.
    pub fn search_people(&self, query: &str) -> Vec<&Person> {
        let needle = query.trim().to_lowercase();
        self.people
            .iter()
            .filter(|person| {
                needle.is_empty()
                    || person.first_name.to_lowercase().contains(&needle)
                    || person.last_name.to_lowercase().contains(&needle)
                    || person.full_name().to_lowercase().contains(&needle)
                    || person
                        .nickname
                        .as_deref()
                        .is_some_and(|nickname| nickname.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn related_people(&self, id: &PersonId) -> StoreResult<RelatedPeople<'_>> {
        let person = self
            .get_person(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(RelatedPeople {
            parents: self.resolve(&person.parent_ids),
            spouses: self.resolve(&person.spouse_ids),
            children: self.resolve(&person.children_ids),
        })
    }

    /// People that could still be related to `id`: everyone except `id`
    /// itself and people already linked to it.
    pub fn relationship_candidates(&self, id: &PersonId) -> StoreResult<Vec<&Person>> {
        let person = self
            .get_person(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(self
            .people
            .iter()
            .filter(|candidate| candidate.id != *id && !person.is_related_to(&candidate.id))
            .collect())
    }

    /// People ordered by birth date; unknown or unparsable dates sort first.
    pub fn timeline(&self) -> Vec<&Person> {
        let mut ordered: Vec<&Person> = self.people.iter().collect();
        ordered.sort_by_key(|person| person.birth());
        ordered
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        check_invariants(&self.people)
    }

    fn position(&self, id: &PersonId) -> StoreResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn resolve(&self, ids: &[PersonId]) -> Vec<&Person> {
        ids.iter().filter_map(|id| self.get_person(id)).collect()
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .people
            .iter()
            .enumerate()
            .map(|(position, person)| (person.id.clone(), position))
            .collect();
    }
}

fn push_unique(ids: &mut Vec<PersonId>, id: &PersonId) -> bool {
    if ids.contains(id) {
        return false;
    }
    ids.push(id.clone());
    true
}

fn strip_all(person: &mut Person, id: &PersonId) -> bool {
    let mut removed = false;
    for list in RelationList::ALL {
        let ids = person.relation_ids_mut(list);
        let before = ids.len();
        ids.retain(|related| related != id);
        removed |= ids.len() != before;
    }
    removed
}
