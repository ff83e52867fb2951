//! Application services layer.

pub mod error;
pub mod export;
pub mod render;
pub mod workspace;
