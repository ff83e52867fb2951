//! Domain layer types and invariants.

pub mod error;
pub mod export;
pub mod theme;
