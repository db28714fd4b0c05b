use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

/// Handle of the runtime work should land on.
///
/// Dispatch may be driven from plain threads (a blocking transport, tests), so callers without
/// an ambient runtime share one lazily built fallback runtime.
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static FALLBACK_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = FALLBACK_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("tessel-worker")
			.build()
			.expect("failed to build tessel-worker fallback runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task tagged with `class`.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(target: "worker", class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Runs synchronous work on the blocking pool, tagged with `class`.
///
/// Feature handlers are CPU-bound and synchronous, so every off-thread dispatch goes through
/// here rather than occupying an async worker.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(target: "worker", class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
