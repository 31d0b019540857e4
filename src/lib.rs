//! wtf-sync - Propagate a prototype character's WTF settings
//!
//! One character is the prototype. Its key bindings, macros, layouts, chat
//! settings and addon SavedVariables are copied to every other character on
//! every account; its account-level SavedVariables are copied to every other
//! account. The copy is one-directional and overwrite-based, so re-running it
//! is always safe.
//!
//! ## Modules
//!
//! - [`config`]: `wtf-sync.conf` parsing and location
//! - [`discovery`]: prototype resolution and account tree enumeration
//! - [`filter`]: character, item and addon exclusion predicates
//! - [`sync`]: the propagation engine
//! - [`fs`]: filesystem abstraction
//! - [`health`]: preflight checks
//! - [`logging`]: `[sync]`-prefixed log stream

pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod fs;
pub mod health;
pub mod logging;
pub mod sync;

pub use config::{Prototype, SyncConfig};
pub use discovery::{AccountTree, ResolvedPrototype, SyncTarget};
pub use error::{ConfigError, Error, ResolveError};
pub use fs::{FileSystem, StdFs};
pub use health::HealthCheck;
pub use sync::{SyncAction, SyncEngine, SyncOptions, SyncSummary};
