//! The per-call wrapper every routed call goes through.
//!
//! [`run`] composes timing, logging, execution mode selection and outcome interpretation
//! around a routed body. Handlers report through [`HandlerResult`]:
//!
//! - `Ok(value)` becomes the response value.
//! - [`HandlerError::Domain`] becomes a protocol error the client sees.
//! - [`HandlerError::Fault`], or a panic, is logged and the call produces no response at all.
//!
//! Nothing a handler does can take down the calling thread or the connection.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value as JsonValue;
use tessel_worker::TaskClass;
use tracing::{debug, error, warn};

use crate::types::{ErrorCode, ResponseError};

/// Whether a call expects a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// A request, answered with a correlated response.
	Request,
	/// A notification, never answered.
	Notification,
}

impl CallKind {
	/// Stable label used in log records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::Notification => "notification",
		}
	}
}

/// One inbound invocation, consumed exactly once by [`run`].
#[derive(Debug)]
pub struct Call {
	/// Method name.
	pub method: String,
	/// Request or notification.
	pub kind: CallKind,
	/// Raw wire params.
	pub params: JsonValue,
	/// When the call was received.
	pub started: Instant,
}

impl Call {
	/// A request received now.
	pub fn request(method: impl Into<String>, params: JsonValue) -> Self {
		Self::new(method, CallKind::Request, params)
	}

	/// A notification received now.
	pub fn notification(method: impl Into<String>, params: JsonValue) -> Self {
		Self::new(method, CallKind::Notification, params)
	}

	fn new(method: impl Into<String>, kind: CallKind, params: JsonValue) -> Self {
		Self {
			method: method.into(),
			kind,
			params,
			started: Instant::now(),
		}
	}
}

/// Where and how a routed body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
	/// Inline on the dispatching thread; the returned future is already resolved.
	Sync,
	/// On a blocking worker; the returned future resolves when the body completes.
	Async,
	/// On a blocking worker without waiting. Requests are acknowledged with `null` at once.
	Detached,
}

/// An error a handler wants the client to see.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct DomainError {
	/// Protocol error code, `RequestFailed` unless chosen otherwise.
	pub code: ErrorCode,
	/// Human readable message.
	pub message: String,
	/// Structured details.
	pub data: Option<JsonValue>,
}

impl DomainError {
	/// A `RequestFailed` error with `message`.
	pub fn new(message: impl Into<String>) -> Self {
		Self::with_code(ErrorCode::REQUEST_FAILED, message)
	}

	/// An error with an explicit code.
	pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	/// Attaches structured details.
	#[must_use]
	pub fn with_data(mut self, data: JsonValue) -> Self {
		self.data = Some(data);
		self
	}

	/// The error for a capability the handler does not implement.
	pub fn method_not_found(method: &str) -> Self {
		Self::with_code(ErrorCode::METHOD_NOT_FOUND, format!("no such method {method}"))
	}
}

impl From<DomainError> for ResponseError {
	fn from(err: DomainError) -> Self {
		Self {
			code: err.code,
			message: err.message,
			data: err.data,
		}
	}
}

/// Failure of a feature handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
	/// Surfaced to the client as a protocol error.
	#[error(transparent)]
	Domain(#[from] DomainError),
	/// Logged; the call then produces no response.
	#[error("{0:#}")]
	Fault(anyhow::Error),
}

impl HandlerError {
	/// Wraps any error as a fault.
	pub fn fault(err: impl Into<anyhow::Error>) -> Self {
		Self::Fault(err.into())
	}
}

impl From<anyhow::Error> for HandlerError {
	fn from(err: anyhow::Error) -> Self {
		Self::Fault(err)
	}
}

/// What a feature handler returns.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Interpreted result of one call.
///
/// `Ok(None)` means the call failed silently and no response must be sent.
pub type Outcome = Result<Option<JsonValue>, ResponseError>;

/// The future [`run`] hands back to the transport.
pub type ResponseFuture = BoxFuture<'static, Outcome>;

/// Describes a successful wire result in the per-call log record, eg. its item count.
pub type Summarizer = fn(&JsonValue) -> String;

/// Runs `body` for `call` in `mode` and interprets its result.
///
/// Exactly one `debug` record per call is emitted once the body has completed.
pub fn run<F>(call: Call, mode: Mode, summarize: Option<Summarizer>, body: F) -> ResponseFuture
where
	F: FnOnce() -> HandlerResult<JsonValue> + Send + 'static,
{
	match mode {
		Mode::Sync => future::ready(execute(&call, summarize, body)).boxed(),
		Mode::Async => {
			let method = call.method.clone();
			let task = tessel_worker::spawn_blocking(TaskClass::Interactive, move || execute(&call, summarize, body));
			async move {
				task.await.unwrap_or_else(|err| {
					error!(target: "lsp.dispatch", %method, error = %err, "worker lost");
					Ok(None)
				})
			}
			.boxed()
		}
		Mode::Detached => {
			let ack = match call.kind {
				CallKind::Request => Some(JsonValue::Null),
				CallKind::Notification => None,
			};
			drop(tessel_worker::spawn_blocking(TaskClass::Background, move || {
				if let Err(err) = execute(&call, summarize, body) {
					warn!(target: "lsp.dispatch", method = %call.method, error = %err, "detached call failed");
				}
			}));
			future::ready(Ok(ack)).boxed()
		}
	}
}

/// Runs `body` to completion on the current thread, catching panics.
pub(crate) fn execute<F>(call: &Call, summarize: Option<Summarizer>, body: F) -> Outcome
where
	F: FnOnce() -> HandlerResult<JsonValue>,
{
	let result = catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
		Err(HandlerError::Fault(anyhow::anyhow!(
			"handler panicked: {}",
			panic_message(payload.as_ref())
		)))
	});
	finish(call, &result, summarize);
	interpret(call, result)
}

fn interpret(call: &Call, result: HandlerResult<JsonValue>) -> Outcome {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(HandlerError::Domain(err)) => Err(err.into()),
		Err(HandlerError::Fault(err)) => {
			error!(
				target: "lsp.dispatch",
				method = %call.method,
				kind = call.kind.as_str(),
				error = ?err,
				"call failed"
			);
			Ok(None)
		}
	}
}

fn finish(call: &Call, result: &HandlerResult<JsonValue>, summarize: Option<Summarizer>) {
	let elapsed_ms = call.started.elapsed().as_secs_f64() * 1000.0;
	let outcome = match result {
		Ok(_) => "ok",
		Err(HandlerError::Domain(_)) => "domain-error",
		Err(HandlerError::Fault(_)) => "fault",
	};
	let summary = match (result, summarize) {
		(Ok(value), Some(summarize)) => match catch_unwind(AssertUnwindSafe(|| summarize(value))) {
			Ok(summary) => Some(summary),
			Err(payload) => {
				warn!(
					target: "lsp.dispatch",
					method = %call.method,
					panic = %panic_message(payload.as_ref()),
					"result summary panicked"
				);
				None
			}
		},
		_ => None,
	};
	debug!(
		target: "lsp.dispatch",
		method = %call.method,
		kind = call.kind.as_str(),
		elapsed_ms,
		outcome,
		summary = summary.as_deref(),
		"lsp.call"
	);
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> PanicMessage<'_> {
	PanicMessage(payload)
}

pub(crate) struct PanicMessage<'a>(&'a (dyn Any + Send));

impl fmt::Display for PanicMessage<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(msg) = self.0.downcast_ref::<String>() {
			f.write_str(msg)
		} else if let Some(msg) = self.0.downcast_ref::<&'static str>() {
			f.write_str(msg)
		} else {
			f.write_str("unknown")
		}
	}
}

#[cfg(test)]
mod tests;
