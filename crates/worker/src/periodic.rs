use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::TaskClass;

/// A fixed-interval loop owned by whoever holds this handle.
///
/// The first tick fires one full `period` after spawning. The loop ends when `tick` returns
/// [`ControlFlow::Break`], when [`PeriodicTask::cancel`] is called, or when the handle is
/// dropped. It never keeps the process alive on its own.
#[derive(Debug)]
pub struct PeriodicTask {
	name: &'static str,
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

impl PeriodicTask {
	/// Spawns `tick` to run every `period` on the current (or fallback) runtime.
	pub fn spawn<F>(name: &'static str, period: Duration, mut tick: F) -> Self
	where
		F: FnMut() -> ControlFlow<()> + Send + 'static,
	{
		let cancel = CancellationToken::new();
		let token = cancel.clone();
		let handle = crate::spawn(TaskClass::Periodic, async move {
			loop {
				tokio::select! {
					biased;
					() = token.cancelled() => {
						tracing::debug!(target: "worker", task = name, "periodic task cancelled");
						break;
					}
					() = tokio::time::sleep(period) => {
						if tick().is_break() {
							tracing::debug!(target: "worker", task = name, "periodic task finished");
							break;
						}
					}
				}
			}
		});
		Self { name, cancel, handle }
	}

	/// Name given at spawn time.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Requests the loop to stop before its next tick.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Returns `true` once cancellation has been requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Returns `true` once the loop has exited.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}
}

impl Drop for PeriodicTask {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}
