//! End-to-end catalog runs through the public `process` entry point.

use laspool_core::{CombineWith, Concat, DispatchError, Flatten, Platform, ProcessOptions, process};
use std::path::PathBuf;
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

fn options(platform: Platform, workers: usize) -> ProcessOptions {
	ProcessOptions {
		platform,
		workers,
		progress: None,
	}
}

fn tile_list(count: usize) -> Vec<PathBuf> {
	(0..count).map(|i| PathBuf::from(format!("tile_{i:02}.las"))).collect()
}

#[tokio::test]
async fn test_path_length_scenario() {
	// Three six-character tile names, two workers, concatenation.
	let tiles = vec![
		PathBuf::from("a.tile"),
		PathBuf::from("b.tile"),
		PathBuf::from("c.tile"),
	];

	let lengths = process(
		&tiles,
		(),
		|_, path| Ok(path.as_os_str().len()),
		Concat,
		options(Platform::Auto, 2),
	)
	.await
	.unwrap();

	assert_eq!(lengths, vec![6, 6, 6]);
}

#[tokio::test]
async fn test_empty_catalog_returns_neutral_element() {
	let tiles: Vec<PathBuf> = Vec::new();
	let invoked = Arc::new(AtomicUsize::new(0));
	let probe = Arc::clone(&invoked);

	let combined = process(
		&tiles,
		(),
		move |_, _| {
			probe.fetch_add(1, Ordering::SeqCst);
			Ok(0u8)
		},
		Concat,
		ProcessOptions::default(),
	)
	.await
	.unwrap();

	assert!(combined.is_empty());
	assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_result_order_is_input_order_on_both_backends() {
	for platform in [Platform::SharedMemory, Platform::Isolated] {
		let tiles = tile_list(40);

		let indices = process(
			&tiles,
			(),
			|_, path| {
				let index: usize = path.to_string_lossy()[5..7].parse()?;
				// Make completion order diverge from input order.
				std::thread::sleep(std::time::Duration::from_millis(((index * 3) % 7) as u64));
				Ok(index)
			},
			Concat,
			options(platform, 4),
		)
		.await
		.unwrap();

		assert_eq!(indices, (0..40).collect::<Vec<_>>(), "backend {platform:?}");
	}
}

#[tokio::test]
async fn test_parallelism_does_not_change_the_aggregate() {
	let tiles = tile_list(25);
	let task = |_: &(), path: &std::path::Path| Ok(path.to_string_lossy().into_owned());

	let sequential = process(&tiles, (), task, Concat, options(Platform::Auto, 1)).await.unwrap();
	let parallel = process(&tiles, (), task, Concat, options(Platform::Auto, 8)).await.unwrap();

	assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn test_failing_tile_fails_the_whole_run() {
	let tiles = vec![
		PathBuf::from("a.tile"),
		PathBuf::from("b.tile"),
		PathBuf::from("c.tile"),
	];

	let error = process(
		&tiles,
		(),
		|_, path| {
			if path.to_string_lossy().starts_with('b') {
				anyhow::bail!("tile is corrupt");
			}
			Ok(path.as_os_str().len())
		},
		Concat,
		options(Platform::Auto, 2),
	)
	.await
	.unwrap_err();

	match error {
		DispatchError::Worker { tile, .. } => assert_eq!(tile, PathBuf::from("b.tile")),
		other => panic!("expected a worker error, got {other:?}"),
	}
}

#[tokio::test]
async fn test_exports_reach_isolated_workers() {
	#[derive(serde::Serialize, serde::Deserialize)]
	struct Exports {
		scale: u64,
	}

	let tiles = tile_list(6);

	let scaled = process(
		&tiles,
		Exports { scale: 10 },
		|exports, path| {
			let index: u64 = path.to_string_lossy()[5..7].parse()?;
			Ok(index * exports.scale)
		},
		Concat,
		options(Platform::Isolated, 3),
	)
	.await
	.unwrap();

	assert_eq!(scaled, vec![0, 10, 20, 30, 40, 50]);
}

#[tokio::test]
async fn test_flatten_combines_rows_across_tiles() {
	let tiles = tile_list(3);

	let rows = process(
		&tiles,
		(),
		|_, path| {
			let index: usize = path.to_string_lossy()[5..7].parse()?;
			Ok(vec![index, index])
		},
		Flatten,
		options(Platform::Auto, 2),
	)
	.await
	.unwrap();

	assert_eq!(rows, vec![0, 0, 1, 1, 2, 2]);
}

#[tokio::test]
async fn test_custom_reduction() {
	let tiles = tile_list(10);

	let total = process(
		&tiles,
		(),
		|_, path| Ok(path.as_os_str().len() as u64),
		CombineWith(|sizes: Vec<u64>| Ok(sizes.iter().sum::<u64>())),
		ProcessOptions::default(),
	)
	.await
	.unwrap();

	// Ten names of eleven characters each.
	assert_eq!(total, 110);
}
