//! # Zoo Core
//!
//! Document store holding Zoo cells.
//!
//! This crate provides:
//! - [`Client`] / [`Database`] / [`Cell`] handles, created on first use
//! - Append-only, checksummed segments per cell, recovered on open
//! - The implicit `_id` index and unique or plain field indexes
//! - [`Filter`]-driven lazy [`Cursor`]s
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/LOCK
//! <root>/<database>/<cell>.seg
//! <root>/<database>/<cell>.idx
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cell;
mod client;
mod config;
mod database;
mod dir;
mod error;
mod filter;
mod id;
mod index;
mod segment;

pub use cell::{Cell, Cursor};
pub use client::Client;
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use filter::{Filter, Projection};
pub use id::RecordId;
pub use index::{IndexSpec, PRIMARY_INDEX};
pub use segment::{CompactionConfig, CompactionResult, SegmentUsage};
