//! Execution plan resolution.
//!
//! One plan is resolved per dispatch call from the requested worker model,
//! the requested worker count, and the host capability. Callers never branch
//! on the platform directly; they request [`Platform::Auto`] and the probe
//! decides.

use crate::DispatchError;

/// Worker model requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
	/// Pick the best worker model for this host.
	#[default]
	Auto,
	/// Workers share the parent's address space; captured state is free.
	SharedMemory,
	/// Workers are isolated; captured state is serialized to each of them.
	Isolated,
}

/// Backend variant selected by plan resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
	/// Thread workers sharing the parent's address space.
	SharedMemory,
	/// Isolated worker contexts with explicitly transmitted exports.
	Isolated,
}

impl BackendKind {
	/// Human-readable name used in log output.
	pub fn as_str(&self) -> &'static str {
		match self {
			BackendKind::SharedMemory => "shared-memory",
			BackendKind::Isolated => "isolated",
		}
	}
}

/// Returns whether this host supports the shared-address-space worker model.
pub fn host_supports_shared_memory() -> bool {
	cfg!(unix)
}

/// Resolved runtime parameters for one dispatch call. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPlan {
	pub backend: BackendKind,
	pub workers: usize,
}

impl ExecutionPlan {
	/// Resolves the requested platform and worker count against the host
	/// capability.
	///
	/// With `Platform::Auto`, a capable host with more than one worker gets
	/// the shared-memory pool; one worker gets the degenerate one-worker
	/// shared pool (runs like a plain loop); an incapable host falls back to
	/// the isolated pool. An explicit shared-memory request on an incapable
	/// host degrades to sequential execution instead of failing.
	pub fn resolve(platform: Platform, workers: usize) -> Result<ExecutionPlan, DispatchError> {
		if workers < 1 {
			return Err(DispatchError::configuration("workers must be at least 1"));
		}

		let plan = match platform {
			Platform::Auto => {
				if workers == 1 || host_supports_shared_memory() {
					ExecutionPlan {
						backend: BackendKind::SharedMemory,
						workers,
					}
				} else {
					ExecutionPlan {
						backend: BackendKind::Isolated,
						workers,
					}
				}
			}
			Platform::SharedMemory => {
				let workers = if host_supports_shared_memory() {
					workers
				} else {
					if workers > 1 {
						log::warn!("shared-memory workers are not supported on this host, running sequentially");
					}
					1
				};
				ExecutionPlan {
					backend: BackendKind::SharedMemory,
					workers,
				}
			}
			Platform::Isolated => ExecutionPlan {
				backend: BackendKind::Isolated,
				workers,
			},
		};

		Ok(plan)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_zero_workers_is_a_configuration_error() {
		let error = ExecutionPlan::resolve(Platform::Auto, 0).unwrap_err();
		assert!(matches!(error, DispatchError::Configuration { .. }));
	}

	#[test]
	fn test_single_worker_resolves_to_degenerate_shared_pool() {
		let plan = ExecutionPlan::resolve(Platform::Auto, 1).unwrap();
		assert_eq!(plan.backend, BackendKind::SharedMemory);
		assert_eq!(plan.workers, 1);
	}

	#[cfg(unix)]
	#[test]
	fn test_auto_prefers_shared_memory_on_capable_hosts() {
		let plan = ExecutionPlan::resolve(Platform::Auto, 8).unwrap();
		assert_eq!(plan.backend, BackendKind::SharedMemory);
		assert_eq!(plan.workers, 8);
	}

	#[cfg(not(unix))]
	#[test]
	fn test_auto_falls_back_to_isolated_on_incapable_hosts() {
		let plan = ExecutionPlan::resolve(Platform::Auto, 8).unwrap();
		assert_eq!(plan.backend, BackendKind::Isolated);
		assert_eq!(plan.workers, 8);
	}

	#[cfg(not(unix))]
	#[test]
	fn test_explicit_shared_memory_degrades_to_sequential() {
		let plan = ExecutionPlan::resolve(Platform::SharedMemory, 8).unwrap();
		assert_eq!(plan.backend, BackendKind::SharedMemory);
		assert_eq!(plan.workers, 1);
	}

	#[rstest]
	#[case(1)]
	#[case(2)]
	#[case(16)]
	fn test_isolated_is_available_everywhere(#[case] workers: usize) {
		let plan = ExecutionPlan::resolve(Platform::Isolated, workers).unwrap();
		assert_eq!(plan.backend, BackendKind::Isolated);
		assert_eq!(plan.workers, workers);
	}

	#[test]
	fn test_backend_names() {
		assert_eq!(BackendKind::SharedMemory.as_str(), "shared-memory");
		assert_eq!(BackendKind::Isolated.as_str(), "isolated");
	}
}
