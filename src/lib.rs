//! Persona Chat: a scripted chat widget engine.
//!
//! Renders question/answer turns into a document tree, reveals answer text
//! word by word on a fixed tick, and resolves free-text questions to canned
//! answers through a keyword index loaded from a persona file.

pub mod core;
pub mod schema;
