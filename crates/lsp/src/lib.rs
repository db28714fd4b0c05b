//! Dispatch core of a [Language Server Protocol][lsp] server.
//!
//! [lsp]: https://microsoft.github.io/language-server-protocol/overviews/lsp/overview/
//!
//! The transport hands parsed messages to a [`Server`], which routes them through two fixed
//! routing tables onto a [`FeatureHandler`] and answers with protocol-shaped values. The pieces,
//! leaves first:
//!
//! - [`coerce`]: permissive wire-to-domain conversion and strict domain-to-wire conversion
//!   with a neutral fallback.
//! - [`dispatch`]: the per-call wrapper adding timing, logging, execution mode selection and
//!   error translation.
//! - [`formatting`]: the single-flight latch around range formatting.
//! - [`router`]: the document and workspace routing tables.
//! - [`producer`]: server-initiated pushes to the client.
//! - [`lifecycle`] and [`liveness`]: the connection state machine and the parent process
//!   probe.
//!
//! Framing, serialization of envelopes and stdio plumbing stay with the embedding transport,
//! which drains the [`Outbox`] and forwards client replies to [`Server::handle_response`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

use std::ops::ControlFlow;

/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
pub use serde_json::Value as JsonValue;
use tower_service::Service;

mod socket;
mod types;

pub mod coerce;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod formatting;
pub mod handler;
pub mod lifecycle;
pub mod liveness;
pub mod producer;
pub mod router;
mod server;

pub use config::ServerConfig;
pub use dispatch::{DomainError, HandlerError, HandlerResult};
pub use handler::{Context, FeatureHandler, Session};
pub use lifecycle::{ConnectionState, ExitHook};
pub use liveness::{PidProbe, ProcessProbe};
pub use producer::Producer;
pub use server::{Server, ServerBuilder};
pub use socket::{ClientSocket, Outbound, Outbox, PendingReply};
pub use types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, RequestId, ResponseError};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the outbound half and of the connection itself.
///
/// Handler failures never surface here; they are translated per call by [`dispatch`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The connection closed before a message could be delivered or answered.
	#[error("service stopped")]
	ServiceStopped,
	/// The client replied with an undecodable result.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// The client replied with an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// A push has no valid wire representation and was not sent.
	#[error("invalid push payload: {0}")]
	Shape(#[from] coerce::ShapeError),
}

/// The service abstraction the transport drives.
pub trait LspService: Service<AnyRequest> {
	/// The handler of [LSP notifications](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#notificationMessage).
	///
	/// Notifications are delivered in order and synchronously. This is mandatory since they can
	/// change the interpretation of later notifications or requests.
	///
	/// # Return
	///
	/// The return value decides whether the transport keeps reading (`Continue`) or closes the
	/// connection (`Break`), which only happens after `exit`.
	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>>;
}
