//! Runtime error taxonomy.
//!
//! Kernel failures pass through unchanged as `Engine`; everything else
//! here is about the files around the kernel.

use std::fmt;
use std::io;
use std::path::PathBuf;

use brew_engine::error::EngineError;

/// One of the three persisted stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreKind {
    Sales,
    Tanks,
    Bottles,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [StoreKind::Sales, StoreKind::Tanks, StoreKind::Bottles];

    pub fn file_name(self) -> &'static str {
        match self {
            StoreKind::Sales => "sales_data.json",
            StoreKind::Tanks => "tanks_status.json",
            StoreKind::Bottles => "bottle_quantities.json",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Sales => "sales",
            StoreKind::Tanks => "tank",
            StoreKind::Bottles => "bottle",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrewError {
    /// A store file is missing, unreadable, or fails to decode.
    #[error("{store} store unavailable at {}: {reason}", path.display())]
    StoreUnavailable {
        store: StoreKind,
        path: PathBuf,
        reason: String,
    },

    /// Baseline hash mismatch or undecodable baseline. Nothing was restored.
    #[error("baseline at {} is corrupt: {reason}", path.display())]
    CorruptBaseline { path: PathBuf, reason: String },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BrewError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BrewError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a missing or unreadable store (the degradable case).
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, BrewError::StoreUnavailable { .. })
    }
}
