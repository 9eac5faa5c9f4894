//! Storage layer: evaluation snapshots and export artifacts on the local filesystem.

mod artifact;
mod error;
mod snapshot;

pub use artifact::write_export;
pub use error::StoreError;
pub use snapshot::{NAMESPACE, SnapshotStore};
