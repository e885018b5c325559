//! Value model, merging, comparison and format-preserving patching for stylist
//!
//! Every supported file format converts to and from one shared value tree
//! (`serde_json::Value` with ordered maps). On top of that tree this crate
//! provides:
//!
//! - [`KeyPath`]: a first-class path of key segments
//! - [`DictBlender`]: flatten/merge used to combine style documents
//! - [`Comparator`]: missing/diff/replace deltas between desired and actual
//!   state, including unique-key reconciliation of record sequences
//! - [`FormatAdapter`]s that load, serialize and patch live documents while
//!   preserving everything the delta does not touch

pub mod blend;
pub mod compare;
pub mod diff;
pub mod document;
pub mod error;
pub mod format;
pub mod handlers;
pub mod path;
pub mod reconcile;
pub mod value;

pub use blend::{DictBlender, flatten, unflatten};
pub use compare::{Change, ChangeKind, CompareOptions, Comparator, Comparison, Normalizer, normalize_scalar};
pub use diff::{DiffStats, unified_diff};
pub use document::Document;
pub use error::{Error, Result};
pub use format::{Format, FormatAdapter};
pub use handlers::{adapter, adapter_for_file};
pub use path::KeyPath;
pub use reconcile::{Reconciliation, reconcile};
pub use value::ValueTree;
