//! Domain model for the family graph.
//!
//! # Responsibility
//! - Define the canonical `Person` record shared by store, layout and persistence.
//! - Define write-side inputs (`PersonDraft`, `PersonPatch`) that cannot touch
//!   relationship lists.
//!
//! # Invariants
//! - Every person is identified by a stable `PersonId`.
//! - Relationship lists are only mutated by the relationship store.

pub mod date;
pub mod person;
pub mod relationship;
