//! Connection state machine.
//!
//! ```text
//! uninitialized --initialize--> initializing --(capabilities computed)--> initialized
//!     --shutdown--> shutting-down --exit--> exited
//! ```
//!
//! The state only moves forward, except that a failed `initialize` returns to
//! uninitialized so the client may retry. `exit` is accepted from every state.

use std::fmt;
use std::sync::Arc;

use lsp_types::request::{self, Request};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::types::{ErrorCode, ResponseError};

/// Where the connection is in its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConnectionState {
	/// Waiting for `initialize`.
	#[default]
	Uninitialized,
	/// `initialize` is being handled.
	Initializing,
	/// Capabilities were negotiated; regular traffic flows.
	Initialized,
	/// `shutdown` was received; waiting for `exit`.
	ShuttingDown,
	/// `exit` was received.
	Exited,
}

impl ConnectionState {
	/// Stable label used in log records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Uninitialized => "uninitialized",
			Self::Initializing => "initializing",
			Self::Initialized => "initialized",
			Self::ShuttingDown => "shutting-down",
			Self::Exited => "exited",
		}
	}
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Terminates the process with the given status.
///
/// The default is [`std::process::exit`]; embedders and tests inject their own.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// The [`ExitHook`] that ends the process.
pub fn process_exit() -> ExitHook {
	Arc::new(exit_process)
}

fn exit_process(code: i32) {
	std::process::exit(code)
}

/// Owner of the [`ConnectionState`].
#[derive(Debug, Default)]
pub struct Lifecycle {
	state: Mutex<ConnectionState>,
}

impl Lifecycle {
	/// A lifecycle waiting for `initialize`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current state.
	pub fn state(&self) -> ConnectionState {
		*self.state.lock()
	}

	/// Gates an inbound request, applying the transition it triggers.
	///
	/// # Errors
	///
	/// - `ServerNotInitialized` for anything but `initialize` before initialization, including
	///   while `initialize` itself is running.
	/// - `InvalidRequest` for a repeated `initialize` and for anything after `shutdown`.
	pub fn admit_request(&self, method: &str) -> Result<(), ResponseError> {
		let mut state = self.state.lock();
		match (*state, method) {
			(ConnectionState::Uninitialized, request::Initialize::METHOD) => {
				transition(&mut state, ConnectionState::Initializing);
				Ok(())
			}
			(ConnectionState::Uninitialized, _) => Err(ResponseError::new(
				ErrorCode::SERVER_NOT_INITIALIZED,
				"server is not initialized",
			)),
			(_, request::Initialize::METHOD) => Err(ResponseError::new(
				ErrorCode::INVALID_REQUEST,
				"server is already initialized",
			)),
			(ConnectionState::Initializing, _) => Err(ResponseError::new(
				ErrorCode::SERVER_NOT_INITIALIZED,
				"server is still initializing",
			)),
			(ConnectionState::Initialized, request::Shutdown::METHOD) => {
				transition(&mut state, ConnectionState::ShuttingDown);
				Ok(())
			}
			(ConnectionState::Initialized, _) => Ok(()),
			(ConnectionState::ShuttingDown | ConnectionState::Exited, _) => Err(ResponseError::new(
				ErrorCode::INVALID_REQUEST,
				"server is shutting down",
			)),
		}
	}

	/// Gates an inbound notification other than `exit`.
	///
	/// Returns `false` when the notification must be ignored.
	pub fn admit_notification(&self, method: &str) -> bool {
		let state = self.state();
		let admitted = state == ConnectionState::Initialized;
		if !admitted {
			debug!(target: "lsp.lifecycle", method, %state, "notification ignored");
		}
		admitted
	}

	/// Marks capabilities as computed.
	pub fn initialized(&self) {
		transition(&mut self.state.lock(), ConnectionState::Initialized);
	}

	/// Returns to [`ConnectionState::Uninitialized`] when `initialize` did not complete.
	///
	/// Does nothing in any other state.
	pub fn abort_initialize(&self) {
		let mut state = self.state.lock();
		let from = *state;
		if from != ConnectionState::Initializing {
			return;
		}
		let to = ConnectionState::Uninitialized;
		info!(target: "lsp.lifecycle", %from, %to, "lsp.lifecycle.transition");
		*state = to;
	}

	/// Moves to [`ConnectionState::Exited`] and returns the exit status.
	///
	/// The status is `0` when `shutdown` came first and `1` otherwise. Returns `None` when the
	/// connection already exited.
	pub fn exit(&self) -> Option<i32> {
		let mut state = self.state.lock();
		let code = match *state {
			ConnectionState::Exited => return None,
			ConnectionState::ShuttingDown => 0,
			_ => 1,
		};
		transition(&mut state, ConnectionState::Exited);
		Some(code)
	}
}

fn transition(state: &mut ConnectionState, to: ConnectionState) {
	let from = *state;
	if to <= from {
		return;
	}
	info!(target: "lsp.lifecycle", %from, %to, "lsp.lifecycle.transition");
	*state = to;
}

#[cfg(test)]
mod tests;
