//! Shared test utilities for the stylist workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`](project::TestProject) builder for a
//!   project directory with styles, configuration and target files

pub mod project;

pub use project::TestProject;
