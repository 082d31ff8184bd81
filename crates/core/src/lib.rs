//! Domain layer shared by every deckforge crate.
//!
//! Holds the error taxonomy, id/timestamp aliases, role constants, the deck
//! building rules, and plain-text sanitization. No I/O happens here.

pub mod error;
pub mod roles;
pub mod rules;
pub mod sanitize;
pub mod types;
