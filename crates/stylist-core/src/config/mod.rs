//! Project configuration and the per-invocation context
//!
//! Settings come from these sources, later ones overriding earlier:
//!
//! 1. **Defaults** - no styles, online, cache expiring after one hour
//! 2. **Project file** - `stylist.toml` at the project root
//! 3. **Environment** - `STYLIST_OFFLINE=1` forces offline mode
//! 4. **Caller** - builder methods on [`Context`] (the CLI maps its flags here)

mod context;
mod project;

pub use context::{Context, OFFLINE_ENV, engine_version};
pub use project::ProjectConfig;
