//! # Zoo Testkit
//!
//! Test utilities for Zoo.
//!
//! This crate provides:
//! - Test fixtures: temporary stores, cells and snapshot files
//! - Property-based test generators using proptest
//! - Content digest test vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zoo_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_cell() {
//!     with_temp_cell(|cell| {
//!         cell.insert(survey_record(0)).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
