//! Parent process liveness probe.
//!
//! An editor that crashes cannot send `exit`. When `initialize` names the editor's process,
//! the server polls it and runs its own exit path once the process is gone.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tessel_worker::PeriodicTask;
use tracing::{info, trace, warn};

/// Answers whether a process is still running.
pub trait ProcessProbe: Send + Sync + 'static {
	/// Returns `false` once `pid` no longer exists.
	fn is_alive(&self, pid: u32) -> bool;
}

/// Checks processes by sending them the null signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidProbe;

impl ProcessProbe for PidProbe {
	#[cfg(unix)]
	fn is_alive(&self, pid: u32) -> bool {
		use rustix::io::Errno;
		use rustix::process::{Pid, test_kill_process};

		let Some(pid) = i32::try_from(pid).ok().and_then(Pid::from_raw) else {
			return false;
		};
		// EPERM: the process exists but belongs to someone else.
		matches!(test_kill_process(pid), Ok(()) | Err(Errno::PERM))
	}

	#[cfg(not(unix))]
	fn is_alive(&self, _pid: u32) -> bool {
		true
	}
}

/// A running probe. Dropping it stops the probe.
#[derive(Debug)]
pub struct LivenessProbe {
	pid: u32,
	task: PeriodicTask,
}

impl LivenessProbe {
	/// Checks `pid` every `interval` and calls `on_orphaned` once when it is gone.
	///
	/// The probe stops after calling `on_orphaned`.
	pub fn start<F>(pid: u32, interval: Duration, probe: Arc<dyn ProcessProbe>, on_orphaned: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		info!(target: "lsp.liveness", pid, interval_ms = interval.as_millis() as u64, "lsp.liveness.start");
		let mut on_orphaned = Some(on_orphaned);
		let task = PeriodicTask::spawn("liveness", interval, move || {
			if probe.is_alive(pid) {
				trace!(target: "lsp.liveness", pid, "parent alive");
				return ControlFlow::Continue(());
			}
			warn!(target: "lsp.liveness", pid, "parent process is gone, exiting");
			if let Some(on_orphaned) = on_orphaned.take() {
				on_orphaned();
			}
			ControlFlow::Break(())
		});
		Self { pid, task }
	}

	/// The watched process.
	pub fn pid(&self) -> u32 {
		self.pid
	}

	/// Stops the probe before its next check.
	pub fn stop(&self) {
		self.task.cancel();
	}

	/// Returns `true` until the probe stopped or fired.
	pub fn is_running(&self) -> bool {
		!self.task.is_cancelled() && !self.task.is_finished()
	}
}
