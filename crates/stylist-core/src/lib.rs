//! Style resolution and enforcement for stylist
//!
//! This crate ties the Layer 0 crates together:
//!
//! - **Configuration**: the per-invocation [`Context`], built from
//!   `stylist.toml`, the environment and caller overrides
//! - **Styles**: references, fetching, caching and the include-graph
//!   resolver that merges every style into one desired-state tree
//! - **Engine**: check, fix and dry-run of every target file the merged
//!   style describes, producing [`Violation`]s
//!
//! # Architecture
//!
//! ```text
//!               stylist-cli
//!                    |
//!               stylist-core
//!                    |
//!         +----------+----------+
//!         |                     |
//!    stylist-fs          stylist-content
//! ```
//!
//! # Example
//!
//! ```ignore
//! use stylist_core::{Context, Engine, Mode};
//! use stylist_fs::NormalizedPath;
//!
//! let context = Context::load(NormalizedPath::new("."))?;
//! let report = Engine::new(&context).run(Mode::Check)?;
//! for violation in &report.violations {
//!     println!("{violation}");
//! }
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod style;
pub mod violation;

pub use check::{Engine, FileChange, Mode, Report};
pub use config::{Context, ProjectConfig};
pub use error::{Error, Result};
pub use style::{CachePolicy, ResolvedStyle, StyleRef, StyleResolver, Transport};
pub use violation::{Violation, ViolationCode};
