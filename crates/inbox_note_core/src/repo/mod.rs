//! Repository layer: the persistence and settings collaborators.
//!
//! # Responsibility
//! - Define the data access contracts the gatekeeper depends on.
//! - Isolate SQLite query details from gate and builder logic.
//!
//! # Invariants
//! - Note writes must pass `Note::validate()` before persistence.
//! - Repository APIs return semantic errors (`Validation`, `NotFound`) in
//!   addition to DB transport errors.

pub mod note_repo;
pub mod settings_repo;
