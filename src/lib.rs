//! Markdown rendering and browser-backed export to PDF, PNG and JPEG.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
