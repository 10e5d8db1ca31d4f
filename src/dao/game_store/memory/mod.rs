mod error;
mod store;

use crate::dao::storage::StorageError;

pub use self::error::SnapshotError;
pub use self::store::MemoryStore;

impl From<SnapshotError> for StorageError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Decode { path, source } => StorageError::Corrupted { path, source },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
