//! Parallel dispatch engine for tiled point-cloud catalogs.
//!
//! A catalog is a dataset too large to process as one unit, split into
//! file-scoped tiles (typically LAS/LAZ files). This crate fans a
//! user-supplied per-tile task out across CPU cores and merges the per-tile
//! results back into a single aggregate. It owns the mechanics only: tile
//! I/O, the task body, and any spatial buffering between adjacent tiles are
//! the caller's business.
//!
//! Two worker models are supported and selected by a capability probe:
//! - **shared memory**: workers share the parent's address space, so captured
//!   state is visible to every worker without transfer;
//! - **isolated**: workers share nothing; the caller's export struct is
//!   serialized and transmitted to each worker context before dispatch, and
//!   all contexts are torn down on every exit path.
//!
//! Regardless of the worker model, every tile is processed exactly once and
//! the result order matches the input tile order.
//!
//! # Quick start
//! ```no_run
//! use laspool_core::{process, Concat, ProcessOptions};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), laspool_core::DispatchError> {
//!     let tiles = vec![PathBuf::from("a.laz"), PathBuf::from("b.laz")];
//!
//!     let sizes = process(
//!         &tiles,
//!         (),
//!         |_, path| Ok(std::fs::metadata(path)?.len()),
//!         Concat,
//!         ProcessOptions::default(),
//!     )
//!     .await?;
//!
//!     assert_eq!(sizes.len(), tiles.len());
//!     Ok(())
//! }
//! ```

mod combine;
mod dispatcher;
mod error;
mod pool;
pub mod progress;
mod types;

pub use combine::*;
pub use dispatcher::*;
pub use error::DispatchError;
pub use pool::*;
pub use types::*;
