//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations and repository persistence.
//! - Keep CLI and UI adapters decoupled from storage details.

pub mod family_service;
