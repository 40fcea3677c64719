//! Core domain logic for Kinship.
//! This crate is the single source of truth for relationship invariants
//! and tree layout.

pub mod config;
pub mod db;
pub mod events;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{load_config, KinshipConfig, LayoutConfig, StorageBackend};
pub use events::{EventDispatcher, FamilyCommand, SubscriptionId, UiEvent};
pub use layout::{
    compute_layout, descendant_forest, EdgeKind, FamilyLayout, LayoutBounds, LayoutEdge,
    LayoutRequest, NodePlacement, TreeNode,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::person::{Gender, LifeEvent, LifeEventKind, Person, PersonDraft, PersonId, PersonPatch};
pub use model::relationship::RelationshipKind;
pub use repo::json_repo::JsonFileFamilyRepository;
pub use repo::sqlite_repo::SqliteFamilyRepository;
pub use repo::{FamilyRepository, RepoError, RepoResult};
pub use service::family_service::{CommandOutcome, FamilyService, ServiceError, ServiceResult};
pub use store::family_store::{EdgeChange, FamilyStore, StoreError, StoreResult};
pub use store::invariants::{InvariantViolation, LoadReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
