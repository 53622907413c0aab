//! Shared-address-space worker pool.

use super::{Exports, TaskFn, TilePool};
use crate::{DispatchError, progress::ProgressBar};
use async_trait::async_trait;
use futures::{StreamExt, future, stream};
use std::{
	path::PathBuf,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

/// Worker pool whose workers share the parent's address space.
///
/// The export struct sits behind one `Arc` and is visible to every worker
/// without transfer. Tiles are not pre-partitioned: each free worker slot
/// pulls the next tile, so uneven per-tile cost never stalls the pool behind
/// the slowest fixed partition. With one worker this degenerates to a plain
/// sequential loop.
pub struct SharedMemoryPool<E> {
	exports: Arc<E>,
	workers: usize,
	progress: Option<ProgressBar>,
}

impl<E> SharedMemoryPool<E> {
	pub fn new(workers: usize, exports: Arc<E>) -> SharedMemoryPool<E> {
		SharedMemoryPool {
			exports,
			workers: workers.max(1),
			progress: None,
		}
	}

	pub fn with_progress(mut self, progress: Option<ProgressBar>) -> SharedMemoryPool<E> {
		self.progress = progress;
		self
	}
}

#[async_trait]
impl<E, R> TilePool<E, R> for SharedMemoryPool<E>
where
	E: Exports,
	R: Send + 'static,
{
	async fn execute(&self, tiles: Vec<PathBuf>, task: TaskFn<E, R>) -> Result<Vec<R>, DispatchError> {
		let count = tiles.len();
		let failed = Arc::new(AtomicBool::new(false));

		let mut slots: Vec<Option<R>> = Vec::with_capacity(count);
		slots.resize_with(count, || None);
		let mut first_error: Option<DispatchError> = None;

		// The stream pulls a new tile only when a worker slot frees up, so
		// checking the failure flag here means: in-flight tiles finish, but
		// nothing new is dispatched once an error is recorded.
		let mut completed = stream::iter(tiles.into_iter().enumerate())
			.map(|(index, tile)| {
				if failed.load(Ordering::Acquire) {
					return future::Either::Left(future::ready(Ok((index, None))));
				}
				let task = Arc::clone(&task);
				let exports = Arc::clone(&self.exports);
				future::Either::Right(tokio::task::spawn_blocking(move || {
					let result = task(&exports, &tile).map_err(|source| DispatchError::Worker { tile, source });
					(index, Some(result))
				}))
			})
			.buffer_unordered(self.workers);

		while let Some(joined) = completed.next().await {
			match joined {
				Ok((index, Some(Ok(value)))) => {
					slots[index] = Some(value);
					if let Some(progress) = &self.progress {
						progress.inc(1);
					}
				}
				Ok((_, Some(Err(error)))) => {
					failed.store(true, Ordering::Release);
					first_error.get_or_insert(error);
				}
				Ok((_, None)) => {}
				Err(error) => panic!("tile task panicked: {error}"),
			}
		}

		if let Some(error) = first_error {
			return Err(error);
		}

		// No error was recorded, so every slot is filled.
		Ok(
			slots
				.into_iter()
				.map(|slot| slot.expect("every dispatched tile produced a result"))
				.collect(),
		)
	}
}
