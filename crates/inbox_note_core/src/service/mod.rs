//! Use-case services.
//!
//! # Responsibility
//! - Build notes from partial configs (`note_builder`).
//! - Decide when the example note is (re)created (`gatekeeper`).
//!
//! # Invariants
//! - Services reach storage only through repository traits.

pub mod gatekeeper;
pub mod note_builder;
