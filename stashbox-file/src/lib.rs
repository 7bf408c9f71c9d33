//! Durable [`Storage`](stashbox_backend::Storage) for stashbox that keeps
//! cache records in plain JSON files, one per namespace.
//!
//! Use it when cached values should survive a restart and the working set is
//! small enough to rewrite a namespace document on each update.
#![warn(missing_docs)]

mod error;
mod storage;

pub use error::FileStorageError;
pub use storage::{FileStorage, FileStorageBuilder};
