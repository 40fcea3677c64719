//! In-memory relationship store.
//!
//! # Responsibility
//! - Own every `Person` record and the bidirectional relationship graph.
//! - Repair snapshots loaded from external stores before they are used.
//!
//! # Invariants
//! - Parent/child and spouse edges are always stored on both sides.
//! - No self-edges, no duplicate edges, no ids of deleted people.
//! - A failed operation leaves the store unchanged.

pub mod family_store;
pub mod invariants;
