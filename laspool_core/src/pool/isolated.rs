//! Isolated worker pool.
//!
//! Workers do not share the parent's memory. Everything the task needs is
//! serialized once into an [`ExportPayload`] and transmitted to each worker
//! context before the first tile is dispatched; each context holds its own
//! private copy. Context allocation and release go through the
//! [`ContextFactory`] seam so tests can observe the full lifecycle with a
//! counting double.

use super::{Exports, TaskFn, TilePool};
use crate::{DispatchError, progress::ProgressBar};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
	collections::VecDeque,
	path::PathBuf,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

/// The serialized export set transmitted to every worker context.
#[derive(Debug, Clone)]
pub struct ExportPayload {
	bytes: Arc<Vec<u8>>,
}

impl ExportPayload {
	/// Serializes the caller's export struct.
	///
	/// A failure here is a configuration error: it is detected before any
	/// tile is dispatched.
	pub fn encode<E: Exports>(exports: &E) -> Result<ExportPayload, DispatchError> {
		let bytes = serde_json::to_vec(exports)
			.map_err(|error| DispatchError::configuration(format!("exports are not serializable: {error}")))?;
		Ok(ExportPayload { bytes: Arc::new(bytes) })
	}

	/// Deserializes one private copy of the export struct.
	pub fn decode<E: Exports>(&self) -> Result<E, DispatchError> {
		serde_json::from_slice(&self.bytes)
			.map_err(|error| DispatchError::configuration(format!("exports could not be decoded: {error}")))
	}

	/// Size of the payload copied to each worker, in bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}

/// Creates and releases isolated worker contexts.
///
/// Production code uses [`SerdeContextFactory`]; tests substitute doubles
/// that count how many contexts were created and released.
#[async_trait]
pub trait ContextFactory<E: Exports>: Send + Sync {
	/// Allocates one worker context holding its own copy of the exports.
	async fn create(&self, payload: &ExportPayload) -> Result<E, DispatchError>;

	/// Releases a worker context.
	async fn destroy(&self, context: E) -> Result<(), DispatchError>;
}

/// Default factory: every context is an independent deserialized copy of the
/// export payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeContextFactory;

#[async_trait]
impl<E: Exports> ContextFactory<E> for SerdeContextFactory {
	async fn create(&self, payload: &ExportPayload) -> Result<E, DispatchError> {
		payload.decode()
	}

	async fn destroy(&self, context: E) -> Result<(), DispatchError> {
		drop(context);
		Ok(())
	}
}

/// Worker pool whose workers share no memory with the parent.
///
/// This is the only pool portable to hosts without the shared worker model,
/// and the more expensive one: the export payload is copied to every worker.
/// Contexts are released unconditionally when the run ends, error or not.
pub struct IsolatedPool<E: Exports> {
	factory: Arc<dyn ContextFactory<E>>,
	payload: ExportPayload,
	workers: usize,
	progress: Option<ProgressBar>,
}

impl<E: Exports> IsolatedPool<E> {
	pub fn new(workers: usize, payload: ExportPayload) -> IsolatedPool<E> {
		IsolatedPool {
			factory: Arc::new(SerdeContextFactory),
			payload,
			workers: workers.max(1),
			progress: None,
		}
	}

	pub fn with_factory(mut self, factory: Arc<dyn ContextFactory<E>>) -> IsolatedPool<E> {
		self.factory = factory;
		self
	}

	pub fn with_progress(mut self, progress: Option<ProgressBar>) -> IsolatedPool<E> {
		self.progress = progress;
		self
	}

	/// Releases contexts, keeping only the first teardown failure.
	async fn teardown(&self, contexts: Vec<E>) -> Result<(), DispatchError> {
		let mut first_failure = None;
		for context in contexts {
			if let Err(error) = self.factory.destroy(context).await {
				first_failure.get_or_insert(error);
			}
		}
		match first_failure {
			None => Ok(()),
			Some(error) => Err(error),
		}
	}
}

#[async_trait]
impl<E, R> TilePool<E, R> for IsolatedPool<E>
where
	E: Exports,
	R: Send + 'static,
{
	async fn execute(&self, tiles: Vec<PathBuf>, task: TaskFn<E, R>) -> Result<Vec<R>, DispatchError> {
		let count = tiles.len();

		// Transmit the export set to every context before any tile is
		// dispatched. If one allocation fails, the ones already created are
		// released and the allocation error wins.
		let mut contexts = Vec::with_capacity(self.workers);
		for _ in 0..self.workers {
			match self.factory.create(&self.payload).await {
				Ok(context) => contexts.push(context),
				Err(error) => {
					let _ = self.teardown(contexts).await;
					return Err(error);
				}
			}
		}
		log::debug!(
			"allocated {} isolated worker contexts ({} bytes of exports each)",
			self.workers,
			self.payload.len()
		);

		let queue: Arc<Mutex<VecDeque<(usize, PathBuf)>>> =
			Arc::new(Mutex::new(tiles.into_iter().enumerate().collect()));
		let failed = Arc::new(AtomicBool::new(false));

		let mut handles = Vec::with_capacity(self.workers);
		for context in contexts {
			let queue = Arc::clone(&queue);
			let failed = Arc::clone(&failed);
			let task = Arc::clone(&task);
			let progress = self.progress.clone();

			// Each worker pulls from the shared queue until it is empty or a
			// sibling recorded a fatal error. The queue pop is the only
			// shared resource between workers.
			handles.push(tokio::task::spawn_blocking(move || {
				let mut produced: Vec<(usize, R)> = Vec::new();
				let mut failure: Option<DispatchError> = None;
				loop {
					if failed.load(Ordering::Acquire) {
						break;
					}
					let Some((index, tile)) = queue.lock().pop_front() else {
						break;
					};
					match task(&context, &tile) {
						Ok(value) => {
							produced.push((index, value));
							if let Some(progress) = &progress {
								progress.inc(1);
							}
						}
						Err(source) => {
							failed.store(true, Ordering::Release);
							failure = Some(DispatchError::Worker { tile, source });
							break;
						}
					}
				}
				(context, produced, failure)
			}));
		}

		let mut slots: Vec<Option<R>> = Vec::with_capacity(count);
		slots.resize_with(count, || None);
		let mut first_error: Option<DispatchError> = None;
		let mut survivors = Vec::with_capacity(self.workers);

		for handle in handles {
			match handle.await {
				Ok((context, produced, failure)) => {
					survivors.push(context);
					for (index, value) in produced {
						slots[index] = Some(value);
					}
					if let Some(error) = failure {
						first_error.get_or_insert(error);
					}
				}
				Err(error) => panic!("tile task panicked: {error}"),
			}
		}

		// Contexts are released on every exit path; a worker error always
		// wins over a teardown error.
		let teardown = self.teardown(survivors).await;
		if let Some(error) = first_error {
			return Err(error);
		}
		teardown?;

		Ok(
			slots
				.into_iter()
				.map(|slot| slot.expect("every dispatched tile produced a result"))
				.collect(),
		)
	}
}
