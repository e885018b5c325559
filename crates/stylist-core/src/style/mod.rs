//! Style documents: where they come from and how they combine
//!
//! - [`StyleRef`]: parsed, canonical style references
//! - [`StyleFetcher`]: scheme-driven retrieval behind a [`Transport`]
//! - [`StyleCache`]: time-based on-disk cache of remote styles
//! - [`StyleResolver`]: include-graph walk producing a [`ResolvedStyle`]

mod cache;
mod fetcher;
mod reference;
mod resolver;
pub mod resources;
pub mod schema;

pub use cache::{CacheEntry, CachePolicy, StyleCache};
pub use fetcher::{HttpTransport, StyleFetcher, Transport};
pub use reference::{DEFAULT_EXTENSION, StyleRef};
pub use resolver::{ResolvedStyle, StyleResolver};
pub use schema::{FileOptions, OneOrMany, StylistSection};
