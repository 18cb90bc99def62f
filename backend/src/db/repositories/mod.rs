//! Repository implementations.
//!
//! - [`local`]: in-memory, for tests and local development
//! - [`file`]: JSON snapshot on disk (feature `file-repo`)

#[cfg(feature = "file-repo")]
pub mod file;
pub mod local;
mod snapshot;

#[cfg(feature = "file-repo")]
pub use file::FileRepository;
pub use local::LocalRepository;
