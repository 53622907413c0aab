//! Concurrency backends executing the tile task over every tile.
//!
//! Two worker models implement the same [`TilePool`] contract:
//!
//! - [`SharedMemoryPool`]: workers share the parent's address space, so the
//!   caller's export struct is visible to every worker behind one `Arc`
//!   without any transfer. Cheap, but any mutable state reachable through it
//!   is shared and unguarded; synchronization is the caller's job.
//! - [`IsolatedPool`]: workers share nothing. The export struct is serialized
//!   once and each worker context deserializes its own private copy before
//!   dispatch starts. More memory- and I/O-intensive, but portable to hosts
//!   without the shared worker model.
//!
//! Both pools hand tiles out one at a time to whichever worker becomes free
//! next, process every tile exactly once, and return the results in input
//! order regardless of completion order. After a fatal error, in-flight
//! tiles are allowed to finish but no new tiles are dispatched.

mod isolated;
mod shared;

pub use isolated::{ContextFactory, ExportPayload, IsolatedPool, SerdeContextFactory};
pub use shared::SharedMemoryPool;

use crate::DispatchError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

/// Captured state shipped to workers.
///
/// This replaces a by-name export list with a plain struct: whatever the
/// task needs beyond the tile path goes in here, and a missing capture is a
/// compile error instead of an unresolved-symbol failure inside a worker.
/// `()` qualifies for tasks that need no captures.
pub trait Exports: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Exports for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// The user-supplied per-tile transformation.
///
/// Must be a pure function of its two arguments; it has no access to the
/// results of other tiles.
pub type TaskFn<E, R> = Arc<dyn Fn(&E, &Path) -> anyhow::Result<R> + Send + Sync>;

/// A pool of workers that executes the tile task once per tile.
///
/// Implementations guarantee exactly-once processing and return the results
/// in input order. Any worker failure fails the whole call; partial results
/// are discarded.
#[async_trait]
pub trait TilePool<E, R>: Send + Sync
where
	E: Exports,
	R: Send + 'static,
{
	async fn execute(&self, tiles: Vec<PathBuf>, task: TaskFn<E, R>) -> Result<Vec<R>, DispatchError>;
}
