//! Command line interface for the laspool dispatch engine.
//!
//! `probe` shows what a given configuration would resolve to on this host;
//! `run` drives a catalog run over the tile files of a directory with a
//! built-in byte-counting task. Neither command decodes LAS/LAZ content.

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use laspool_core::{
	CombineWith, ExecutionPlan, Platform, ProcessOptions, host_supports_shared_memory, process, progress::ProgressBar,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "laspool", version, about = "Parallel dispatch engine for tiled LAS/LAZ catalogs")]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print the host capability and the resolved execution plan.
	Probe {
		/// Worker model to resolve.
		#[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
		platform: PlatformArg,

		/// Worker count to resolve; defaults to the logical core count.
		#[arg(long)]
		workers: Option<usize>,
	},

	/// Count tiles and bytes in a directory of tile files.
	Run {
		/// Directory containing the catalog's tile files.
		directory: PathBuf,

		/// Comma-separated list of file extensions to treat as tiles.
		#[arg(long, default_value = "las,laz")]
		extensions: String,

		/// Worker model to use.
		#[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
		platform: PlatformArg,

		/// Worker count; defaults to the logical core count.
		#[arg(long)]
		workers: Option<usize>,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlatformArg {
	Auto,
	SharedMemory,
	Isolated,
}

impl From<PlatformArg> for Platform {
	fn from(value: PlatformArg) -> Platform {
		match value {
			PlatformArg::Auto => Platform::Auto,
			PlatformArg::SharedMemory => Platform::SharedMemory,
			PlatformArg::Isolated => Platform::Isolated,
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::init();

	match Cli::parse().command {
		Command::Probe { platform, workers } => probe(platform.into(), workers),
		Command::Run {
			directory,
			extensions,
			platform,
			workers,
		} => run(&directory, &extensions, platform.into(), workers).await,
	}
}

fn probe(platform: Platform, workers: Option<usize>) -> Result<()> {
	let cores = num_cpus::get();
	let workers = workers.unwrap_or(cores);
	let plan = ExecutionPlan::resolve(platform, workers)?;

	println!("logical cores:       {cores}");
	println!(
		"shared-memory model: {}",
		if host_supports_shared_memory() { "supported" } else { "unsupported" }
	);
	println!("resolved backend:    {}", plan.backend.as_str());
	println!("resolved workers:    {}", plan.workers);
	Ok(())
}

async fn run(directory: &Path, extensions: &str, platform: Platform, workers: Option<usize>) -> Result<()> {
	let tiles = scan_tiles(directory, extensions)?;
	log::debug!("found {} tile files in '{}'", tiles.len(), directory.display());
	ensure!(
		!tiles.is_empty(),
		"no tile files with extensions '{extensions}' found in '{}'",
		directory.display()
	);

	let options = ProcessOptions {
		platform,
		workers: workers.unwrap_or_else(num_cpus::get),
		progress: Some(ProgressBar::new("processing tiles", tiles.len() as u64)),
	};

	let tile_count = tiles.len();
	let total_bytes = process(
		&tiles,
		(),
		|_, path| {
			let metadata =
				std::fs::metadata(path).with_context(|| format!("could not stat tile '{}'", path.display()))?;
			Ok(metadata.len())
		},
		CombineWith(|sizes: Vec<u64>| Ok(sizes.iter().sum::<u64>())),
		options,
	)
	.await?;

	println!("tiles:       {tile_count}");
	println!("total bytes: {total_bytes}");
	Ok(())
}

/// Lists the files in `directory` whose extension matches one of the
/// comma-separated `extensions` (case-insensitive), sorted by name so the
/// tile order is deterministic.
fn scan_tiles(directory: &Path, extensions: &str) -> Result<Vec<PathBuf>> {
	let wanted: Vec<String> = extensions
		.split(',')
		.map(|extension| extension.trim().to_ascii_lowercase())
		.filter(|extension| !extension.is_empty())
		.collect();

	let entries =
		std::fs::read_dir(directory).with_context(|| format!("could not read directory '{}'", directory.display()))?;

	let mut tiles = Vec::new();
	for entry in entries {
		let path = entry?.path();
		if !path.is_file() {
			continue;
		}
		let matches = path
			.extension()
			.map(|extension| wanted.contains(&extension.to_string_lossy().to_ascii_lowercase()))
			.unwrap_or(false);
		if matches {
			tiles.push(path);
		}
	}
	tiles.sort();
	Ok(tiles)
}
