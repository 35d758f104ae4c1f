//! Domain model for inbox notes.
//!
//! # Responsibility
//! - Define the persisted note record and the partial input it is built from.
//! - Keep note invariants next to the data they constrain.
//!
//! # Invariants
//! - Every persisted note is identified by a stable `NoteId`.
//! - Note names are dedup keys, not unique keys.

pub mod config;
pub mod note;
