//! Error types of the in-memory store and its JSON snapshot file.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenient result alias returning [`SnapshotError`] failures.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Failures that can occur while loading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file exists but could not be read.
    #[error("failed to read snapshot `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The snapshot file content is not a valid snapshot.
    #[error("failed to decode snapshot `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory content could not be serialized.
    #[error("failed to encode snapshot")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    /// Writing the snapshot to disk failed.
    #[error("failed to write snapshot `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
