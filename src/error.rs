use std::fmt;

use thiserror::Error;

/// Asset the simulation waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Avatar,
    Animations,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avatar => f.write_str("Avatar"),
            Self::Animations => f.write_str("Anim"),
        }
    }
}

/// Reason an avatar or clip load was rejected.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("invalid mesh {path}: {reason}")]
    Mesh { path: String, reason: String },
    #[error("invalid animation manifest {path}: {reason}")]
    Manifest { path: String, reason: String },
    #[error("no {0} clip available")]
    MissingClip(&'static str),
}

/// Failures surfaced to the debug console. None of them stop the frame loop.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("{kind} error: {source}")]
    AssetLoad {
        kind: AssetKind,
        #[source]
        source: AssetError,
    },
    #[error("Window: {0}")]
    RuntimeFault(String),
}

impl ViewerError {
    pub fn asset(kind: AssetKind, source: AssetError) -> Self {
        Self::AssetLoad { kind, source }
    }

    /// Records the error on the `log` stream, which feeds the debug console.
    pub fn report(&self) {
        log::error!("{self}");
    }
}
