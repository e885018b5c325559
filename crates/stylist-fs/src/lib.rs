//! Filesystem abstraction for stylist
//!
//! Provides normalized path handling, project-relative resolution and
//! safe I/O operations for target files and cache artifacts.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, StoreFormat};
pub use constants::StylistPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
