//! Run orchestration: plan resolution, backend selection, timing and result
//! combination.

use crate::{
	BackendKind, Combine, DispatchError, ExecutionPlan, ExportPayload, Exports, Platform, TileSource,
	pool::{IsolatedPool, SharedMemoryPool, TaskFn, TilePool},
	progress::ProgressBar,
};
use std::{path::Path, sync::Arc, time::Instant};

/// Runtime options for one [`process`] call.
///
/// ```
/// use laspool_core::{Platform, ProcessOptions};
///
/// let options = ProcessOptions {
///     workers: 4,
///     ..Default::default()
/// };
/// assert_eq!(options.platform, Platform::Auto);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessOptions {
	/// Requested worker model; resolved against the host capability.
	pub platform: Platform,
	/// Upper bound on tiles in flight. Defaults to the logical core count.
	pub workers: usize,
	/// Optional progress bar, bumped once per completed tile.
	pub progress: Option<ProgressBar>,
}

impl Default for ProcessOptions {
	fn default() -> ProcessOptions {
		ProcessOptions {
			platform: Platform::Auto,
			workers: num_cpus::get().max(1),
			progress: None,
		}
	}
}

/// Applies `task` to every tile of `tiles` and reduces the ordered per-tile
/// results with `combine`.
///
/// The task must be a pure function of the export struct and one tile path;
/// it is invoked exactly once per tile, with at most `options.workers` tiles
/// in flight. The call does not return until every tile has been processed
/// or a fatal error has been recorded; there is no cancellation and no
/// retry. An empty catalog returns the combine strategy's neutral element
/// without invoking the task.
///
/// Progress and log output are observational only and never affect the
/// returned value.
pub async fn process<S, E, R, C, F>(
	tiles: &S,
	exports: E,
	task: F,
	combine: C,
	options: ProcessOptions,
) -> Result<C::Output, DispatchError>
where
	S: TileSource + ?Sized,
	E: Exports,
	R: Send + 'static,
	C: Combine<R>,
	F: Fn(&E, &Path) -> anyhow::Result<R> + Send + Sync + 'static,
{
	let plan = ExecutionPlan::resolve(options.platform, options.workers)?;
	let tiles = tiles.tile_paths();
	let count = tiles.len();

	log::info!("processing catalog of {count} tiles");

	if count == 0 {
		// Neutral element of the strategy; the task is never invoked.
		return combine
			.combine(Vec::new())
			.map_err(|source| DispatchError::Combine { source });
	}

	log::info!("using the {} backend with {} workers", plan.backend.as_str(), plan.workers);
	if let Some(progress) = &options.progress {
		progress.set_len(count as u64);
	}

	let start = Instant::now();
	let task: TaskFn<E, R> = Arc::new(task);

	let executed = match plan.backend {
		BackendKind::SharedMemory => {
			SharedMemoryPool::new(plan.workers, Arc::new(exports))
				.with_progress(options.progress.clone())
				.execute(tiles, task)
				.await
		}
		BackendKind::Isolated => {
			let payload = ExportPayload::encode(&exports)?;
			IsolatedPool::new(plan.workers, payload)
				.with_progress(options.progress.clone())
				.execute(tiles, task)
				.await
		}
	};

	let elapsed_minutes = start.elapsed().as_secs_f64() / 60.0;
	let results = match executed {
		Ok(results) => {
			if let Some(progress) = &options.progress {
				progress.finish();
			}
			log::info!("catalog processed in {elapsed_minutes:.1} minutes");
			results
		}
		Err(error) => {
			if let Some(progress) = &options.progress {
				progress.remove();
			}
			log::warn!("catalog run failed after {elapsed_minutes:.1} minutes: {error}");
			return Err(error);
		}
	};

	combine
		.combine(results)
		.map_err(|source| DispatchError::Combine { source })
}
