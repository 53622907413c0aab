//! Catalog seam: anything that can enumerate an ordered list of tile files.

use std::path::PathBuf;

/// An ordered collection of tile files belonging to one dataset.
///
/// The engine never interprets the paths; each one is handed verbatim to the
/// tile task, exactly once. The order returned here defines the order of the
/// per-tile results.
pub trait TileSource {
	/// Returns the tile files in catalog order.
	fn tile_paths(&self) -> Vec<PathBuf>;
}

impl TileSource for Vec<PathBuf> {
	fn tile_paths(&self) -> Vec<PathBuf> {
		self.clone()
	}
}

impl TileSource for [PathBuf] {
	fn tile_paths(&self) -> Vec<PathBuf> {
		self.to_vec()
	}
}

impl TileSource for Vec<&str> {
	fn tile_paths(&self) -> Vec<PathBuf> {
		self.iter().map(PathBuf::from).collect()
	}
}
