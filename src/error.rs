//! Error types for wtf-sync
//!
//! Configuration and resolution failures are fatal and abort a run before any
//! filesystem mutation. Per-item copy failures are not errors at this level;
//! they are recorded in the [`SyncSummary`](crate::sync::SyncSummary).

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Failures while locating or parsing the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is missing the required `prototype=` line")]
    MissingPrototype,

    #[error(
        "invalid prototype `{0}`: expected <account>/<character> or <account>/<realm>/<character>"
    )]
    InvalidPrototype(String),

    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while locating the prototype or the account tree
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("account root not found: {}", .0.display())]
    AccountRootNotFound(PathBuf),

    #[error("prototype {prototype} not found under {}", searched.display())]
    PrototypeNotFound { prototype: String, searched: PathBuf },

    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Directory the failure is about
    pub fn path(&self) -> &Path {
        match self {
            ResolveError::AccountRootNotFound(path) => path,
            ResolveError::PrototypeNotFound { searched, .. } => searched,
            ResolveError::Io { path, .. } => path,
        }
    }
}
