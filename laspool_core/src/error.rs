//! Errors surfaced by the dispatch engine.

use std::path::PathBuf;

/// Errors that can occur while dispatching a catalog run.
///
/// There are no retries anywhere in the engine: every failure propagates to
/// the caller of [`process`](crate::process), and partial results are
/// discarded.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
	/// The run was misconfigured (invalid worker count, unserializable
	/// exports). Surfaced before any tile is dispatched.
	#[error("invalid configuration: {message}")]
	Configuration { message: String },

	/// The tile task failed while processing a specific tile. Terminal for
	/// the whole run, even if other tiles completed successfully.
	#[error("tile task failed for '{}'", .tile.display())]
	Worker {
		tile: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	/// Isolated worker contexts could not be released during cleanup.
	///
	/// Never masks a prior [`Worker`](DispatchError::Worker) error; the first
	/// fatal cause wins.
	#[error("worker context teardown failed: {message}")]
	Teardown { message: String },

	/// The combine strategy rejected the collected per-tile results.
	#[error("combining per-tile results failed")]
	Combine {
		#[source]
		source: anyhow::Error,
	},
}

impl DispatchError {
	pub(crate) fn configuration(message: impl Into<String>) -> Self {
		DispatchError::Configuration { message: message.into() }
	}
}
