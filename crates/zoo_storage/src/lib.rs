//! # Zoo Storage
//!
//! Append-only byte stores used by the Zoo document store.
//!
//! Every cell is persisted as one segment log: a sequence of framed records
//! appended to a [`StorageBackend`]. Backends know nothing about that
//! framing; they only append bytes, hand them back by offset, and cut a torn
//! tail off during recovery.
//!
//! ## Backends
//!
//! - [`InMemoryBackend`] - cells of an in-memory client (tests, scratch work)
//! - [`FileBackend`] - one file per cell under the client root
//!
//! ## Example
//!
//! ```rust
//! use zoo_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut segment = InMemoryBackend::new();
//! let offset = segment.append(b"{\"a\":1}").unwrap();
//! assert_eq!(segment.read_at(offset, 7).unwrap(), b"{\"a\":1}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
