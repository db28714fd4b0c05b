//! Outbound channel to the client and the pending-request table.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use lsp_types::notification::Notification;
use lsp_types::request::Request;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::types::{AnyNotification, AnyRequest, AnyResponse, RequestId};
use crate::{Error, Result};

/// A server-initiated message waiting for the transport to write it.
#[derive(Debug, Clone)]
pub enum Outbound {
	/// A push that expects no reply.
	Notification(AnyNotification),
	/// A push whose reply must be fed back through [`crate::Server::handle_response`].
	Request(AnyRequest),
}

impl Outbound {
	/// Method name of the wrapped message.
	pub fn method(&self) -> &str {
		match self {
			Self::Notification(notif) => &notif.method,
			Self::Request(req) => &req.method,
		}
	}

	/// Params of the wrapped message.
	pub fn params(&self) -> &JsonValue {
		match self {
			Self::Notification(notif) => &notif.params,
			Self::Request(req) => &req.params,
		}
	}
}

/// Receiving end of all server-initiated messages, drained by the transport.
pub type Outbox = mpsc::UnboundedReceiver<Outbound>;

#[derive(Debug, Default)]
struct PendingState {
	closed: bool,
	waiting: HashMap<RequestId, oneshot::Sender<AnyResponse>>,
}

#[derive(Debug, Default)]
struct PendingTable {
	next_id: AtomicI32,
	state: Mutex<PendingState>,
}

/// Handle for sending messages to the client.
///
/// Cheap to clone; all clones share one pending-request table keyed by request id.
#[derive(Debug, Clone)]
pub struct ClientSocket {
	tx: mpsc::UnboundedSender<Outbound>,
	pending: Arc<PendingTable>,
}

impl ClientSocket {
	/// Creates a socket and the outbox the transport drains.
	pub(crate) fn new() -> (Self, Outbox) {
		let (tx, rx) = mpsc::unbounded_channel();
		let socket = Self {
			tx,
			pending: Arc::default(),
		};
		(socket, rx)
	}

	/// Sends a typed notification.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the outbox was dropped.
	pub fn notify<N: Notification>(&self, params: N::Params) -> Result<()> {
		self.notify_value(N::METHOD, serde_json::to_value(params)?)
	}

	/// Sends a notification whose params are already wire-shaped.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the outbox was dropped.
	pub fn notify_value(&self, method: &str, params: JsonValue) -> Result<()> {
		trace!(target: "lsp.socket", method, "outbound notification");
		self.tx
			.send(Outbound::Notification(AnyNotification {
				method: method.into(),
				params,
			}))
			.map_err(|_| Error::ServiceStopped)
	}

	/// Sends a typed request and returns a handle to its reply.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is closed.
	pub fn request<R: Request>(&self, params: R::Params) -> Result<PendingReply<R::Result>> {
		self.request_value(R::METHOD, serde_json::to_value(params)?)
	}

	/// Sends a request whose params are already wire-shaped.
	///
	/// The reply is matched by a fresh numeric id; dropping the returned [`PendingReply`]
	/// forgets the request, and a later reply to it is ignored.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is closed.
	pub fn request_value<T: DeserializeOwned>(&self, method: &str, params: JsonValue) -> Result<PendingReply<T>> {
		let id = RequestId::Number(self.pending.next_id.fetch_add(1, Ordering::Relaxed));
		let (resp_tx, resp_rx) = oneshot::channel();
		{
			let mut state = self.pending.state.lock();
			if state.closed {
				return Err(Error::ServiceStopped);
			}
			state.waiting.insert(id.clone(), resp_tx);
		}

		trace!(target: "lsp.socket", method, %id, "outbound request");
		let sent = self.tx.send(Outbound::Request(AnyRequest {
			id: id.clone(),
			method: method.into(),
			params,
		}));
		if sent.is_err() {
			self.pending.state.lock().waiting.remove(&id);
			return Err(Error::ServiceStopped);
		}

		Ok(PendingReply {
			id,
			rx: resp_rx,
			pending: self.pending.clone(),
			_result: PhantomData,
		})
	}

	/// Resolves the pending request `resp` answers.
	///
	/// Returns `false` when no request with that id is pending.
	pub fn complete(&self, resp: AnyResponse) -> bool {
		let Some(waiter) = self.pending.state.lock().waiting.remove(&resp.id) else {
			debug!(target: "lsp.socket", id = %resp.id, "reply for unknown request");
			return false;
		};
		// The waiter may have been dropped by a caller that stopped caring.
		let _ = waiter.send(resp);
		true
	}

	/// Number of requests still waiting for a reply.
	pub fn pending(&self) -> usize {
		self.pending.state.lock().waiting.len()
	}

	/// Refuses further requests and fails every pending one with `Error::ServiceStopped`.
	pub(crate) fn close(&self) {
		let mut state = self.pending.state.lock();
		state.closed = true;
		let dropped = state.waiting.len();
		state.waiting.clear();
		if dropped > 0 {
			debug!(target: "lsp.socket", dropped, "connection closed with pending requests");
		}
	}
}

/// A reply the client has not sent yet.
#[derive(Debug)]
#[must_use = "dropping a PendingReply abandons the client's answer"]
pub struct PendingReply<T> {
	id: RequestId,
	rx: oneshot::Receiver<AnyResponse>,
	pending: Arc<PendingTable>,
	_result: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PendingReply<T> {
	/// Correlation token of the request.
	pub fn id(&self) -> &RequestId {
		&self.id
	}

	/// Waits for the reply. There is no timeout.
	///
	/// # Errors
	///
	/// - `Error::ServiceStopped` when the connection closed first.
	/// - `Error::Response` when the client answered with an error.
	/// - `Error::Deserialize` when the result does not decode as `T`.
	pub async fn recv(mut self) -> Result<T> {
		let resp = (&mut self.rx).await.map_err(|_| Error::ServiceStopped)?;
		decode(resp)
	}

	/// Blocks the current thread until the reply arrives. There is no timeout.
	///
	/// Meant for feature handlers running on blocking worker threads; calling this from an
	/// async context panics.
	///
	/// # Errors
	///
	/// Same as [`PendingReply::recv`].
	pub fn blocking_recv(mut self) -> Result<T> {
		// `Receiver::blocking_recv` consumes the receiver, which can't be moved out of a `Drop` type.
		let rx = std::mem::replace(&mut self.rx, oneshot::channel().1);
		let resp = rx.blocking_recv().map_err(|_| Error::ServiceStopped)?;
		decode(resp)
	}
}

impl<T> Drop for PendingReply<T> {
	fn drop(&mut self) {
		self.pending.state.lock().waiting.remove(&self.id);
	}
}

fn decode<T: DeserializeOwned>(resp: AnyResponse) -> Result<T> {
	if let Some(err) = resp.error {
		return Err(err.into());
	}
	Ok(serde_json::from_value(resp.result.unwrap_or(JsonValue::Null))?)
}
