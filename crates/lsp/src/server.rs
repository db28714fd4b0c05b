//! The server façade the transport drives.
//!
//! [`Server`] gates every inbound message through the [`Lifecycle`], answers the lifecycle
//! methods itself and hands everything else to the routing tables.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, OnceLock};
use std::task::Poll;

use futures::FutureExt;
use futures::future;
use lsp_types::notification::{self, Notification};
use lsp_types::request::{self, Request};
use lsp_types::{InitializeResult, ServerCapabilities, ServerInfo};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tower_service::Service;
use tracing::{debug, info, warn};

use crate::coerce::to_domain;
use crate::config::ServerConfig;
use crate::dispatch::{self, Call, CallKind, HandlerError, HandlerResult, Mode, ResponseFuture};
use crate::domain::InitializeParams;
use crate::formatting::FormattingLatch;
use crate::handler::{Context, FeatureHandler, Session};
use crate::lifecycle::{ConnectionState, ExitHook, Lifecycle, process_exit};
use crate::liveness::{LivenessProbe, PidProbe, ProcessProbe};
use crate::producer::{Producer, watcher_options};
use crate::router::Router;
use crate::socket::{ClientSocket, Outbox};
use crate::types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, ResponseError};
use crate::{LspService, Result};

/// Registration id of the file watcher installed after `initialized`.
const WATCH_REGISTRATION: &str = "tessel/watched-files";

/// Assembles a [`Server`] around a [`FeatureHandler`].
pub struct ServerBuilder<H> {
	handler: H,
	config: ServerConfig,
	exit_hook: ExitHook,
	process_probe: Arc<dyn ProcessProbe>,
}

impl<H: FeatureHandler> ServerBuilder<H> {
	/// Starts from the default configuration, exiting the process on `exit`.
	pub fn new(handler: H) -> Self {
		Self {
			handler,
			config: ServerConfig::default(),
			exit_hook: process_exit(),
			process_probe: Arc::new(PidProbe),
		}
	}

	/// Replaces the configuration.
	pub fn config(mut self, config: ServerConfig) -> Self {
		self.config = config;
		self
	}

	/// Replaces what happens once `exit` computed its status.
	pub fn exit_hook(mut self, hook: impl Fn(i32) + Send + Sync + 'static) -> Self {
		self.exit_hook = Arc::new(hook);
		self
	}

	/// Replaces how the liveness probe checks the editor process.
	pub fn process_probe(mut self, probe: impl ProcessProbe) -> Self {
		self.process_probe = Arc::new(probe);
		self
	}

	/// Builds the server and the outbox the transport drains.
	pub fn build(self) -> (Server<H>, Outbox) {
		let (socket, outbox) = ClientSocket::new();
		let session = Arc::new(OnceLock::new());
		let producer = Producer::new(socket.clone(), session.clone(), self.config.progress_token.clone());
		let latch = Arc::new(FormattingLatch::new());
		let router = Router::new(latch.clone());
		let capabilities = router.server_capabilities(&self.config, self.handler.commands());
		let cx = Arc::new(Context::new(producer, session.clone(), self.config));

		let inner = Inner {
			handler: Arc::new(self.handler),
			cx,
			session,
			router,
			lifecycle: Lifecycle::new(),
			socket,
			latch,
			capabilities,
			exit_hook: self.exit_hook,
			process_probe: self.process_probe,
			probe: Mutex::new(None),
		};
		(Server { inner: Arc::new(inner) }, outbox)
	}
}

/// The dispatch core behind one client connection.
///
/// Requests enter through [`Service::call`] (or [`Server::respond`]), notifications through
/// [`LspService::notify`] and client replies through [`Server::handle_response`]. Clones share
/// the same connection.
pub struct Server<H> {
	inner: Arc<Inner<H>>,
}

struct Inner<H> {
	handler: Arc<H>,
	cx: Arc<Context>,
	session: Arc<OnceLock<Session>>,
	router: Router<H>,
	lifecycle: Lifecycle,
	socket: ClientSocket,
	latch: Arc<FormattingLatch>,
	capabilities: ServerCapabilities,
	exit_hook: ExitHook,
	process_probe: Arc<dyn ProcessProbe>,
	probe: Mutex<Option<LivenessProbe>>,
}

impl<H> Clone for Server<H> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<H> fmt::Debug for Server<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Server")
			.field("state", &self.inner.lifecycle.state())
			.field("pending", &self.inner.socket.pending())
			.finish_non_exhaustive()
	}
}

impl<H: FeatureHandler> Server<H> {
	/// Shorthand for [`ServerBuilder::new`].
	pub fn builder(handler: H) -> ServerBuilder<H> {
		ServerBuilder::new(handler)
	}

	/// Handles `req` and wraps the outcome in a response envelope.
	///
	/// Returns `None` when the call failed silently and no response must be sent.
	pub async fn respond(&self, req: AnyRequest) -> Option<AnyResponse> {
		let id = req.id.clone();
		match self.inner.request(req).await {
			Ok(Some(result)) => Some(AnyResponse {
				id,
				result: Some(result),
				error: None,
			}),
			Ok(None) => None,
			Err(err) => Some(AnyResponse {
				id,
				result: None,
				error: Some(err),
			}),
		}
	}

	/// Feeds a client reply to the server-initiated request waiting for it.
	///
	/// Returns `false` when nothing was waiting.
	pub fn handle_response(&self, resp: AnyResponse) -> bool {
		self.inner.socket.complete(resp)
	}

	/// Current connection state.
	pub fn state(&self) -> ConnectionState {
		self.inner.lifecycle.state()
	}

	/// The capability descriptor returned by `initialize`.
	pub fn capabilities(&self) -> &ServerCapabilities {
		&self.inner.capabilities
	}

	/// Context shared with the feature handler.
	pub fn context(&self) -> &Context {
		&self.inner.cx
	}

	/// The feature handler.
	pub fn handler(&self) -> &H {
		&self.inner.handler
	}

	/// Whether a range formatting call currently holds the latch.
	pub fn formatting_busy(&self) -> bool {
		self.inner.latch.is_busy()
	}

	/// Whether the parent process probe is active.
	pub fn probing_parent(&self) -> bool {
		self.inner.probe.lock().as_ref().is_some_and(LivenessProbe::is_running)
	}
}

impl<H: FeatureHandler> Inner<H> {
	fn request(self: &Arc<Self>, req: AnyRequest) -> ResponseFuture {
		if let Err(err) = self.lifecycle.admit_request(&req.method) {
			debug!(target: "lsp.lifecycle", method = %req.method, error = %err, "request rejected");
			return future::ready(Err(err)).boxed();
		}

		let mut call = Call::request(req.method, req.params);
		if call.method == request::Initialize::METHOD {
			let params = std::mem::take(&mut call.params);
			let inner = self.clone();
			let outcome = dispatch::run(call, Mode::Sync, None, move || inner.initialize(params));
			// The body already ran; still initializing means it failed or panicked.
			self.lifecycle.abort_initialize();
			return outcome;
		}
		if call.method == request::Shutdown::METHOD {
			let inner = self.clone();
			return dispatch::run(call, Mode::Sync, None, move || {
				inner.handler.shutdown(&inner.cx)?;
				Ok(JsonValue::Null)
			});
		}

		let Some(route) = self.router.get(&call.method).filter(|route| route.kind == CallKind::Request) else {
			debug!(target: "lsp.dispatch", method = %call.method, "no route for request");
			return future::ready(Err(ResponseError::new(
				ErrorCode::METHOD_NOT_FOUND,
				format!("no handler for {}", call.method),
			)))
			.boxed();
		};
		route.dispatch(self.handler.clone(), self.cx.clone(), call)
	}

	fn notify(self: &Arc<Self>, notif: AnyNotification) -> ControlFlow<Result<()>> {
		if notif.method == notification::Exit::METHOD {
			self.exit();
			return ControlFlow::Break(Ok(()));
		}
		if notif.method.starts_with("$/") {
			debug!(target: "lsp.dispatch", method = %notif.method, "ignored notification");
			return ControlFlow::Continue(());
		}
		if !self.lifecycle.admit_notification(&notif.method) {
			return ControlFlow::Continue(());
		}

		if notif.method == notification::Initialized::METHOD {
			let inner = self.clone();
			let call = Call::notification(notif.method, notif.params);
			drop(dispatch::run(call, Mode::Sync, None, move || inner.initialized()));
			return ControlFlow::Continue(());
		}

		match self.router.get(&notif.method).filter(|route| route.kind == CallKind::Notification) {
			// Notification routes run inline or detached; the future only carries the empty outcome.
			Some(route) => drop(route.dispatch(
				self.handler.clone(),
				self.cx.clone(),
				Call::notification(notif.method, notif.params),
			)),
			None => debug!(target: "lsp.dispatch", method = %notif.method, "ignored notification"),
		}
		ControlFlow::Continue(())
	}

	fn initialize(self: &Arc<Self>, params: JsonValue) -> HandlerResult<JsonValue> {
		let params: InitializeParams = to_domain(request::Initialize::METHOD, params);
		let session = Session::from(params);
		info!(
			target: "lsp.lifecycle",
			root = session.root_uri.as_deref(),
			process_id = session.process_id,
			"lsp.initialize"
		);

		self.handler.initialize(&self.cx, &session)?;
		let config = self.cx.config();
		let result = InitializeResult {
			capabilities: self.capabilities.clone(),
			server_info: Some(ServerInfo {
				name: config.name.clone(),
				version: config.version.clone(),
			}),
		};
		let result = serde_json::to_value(result).map_err(HandlerError::fault)?;

		let session = self.session.get_or_init(|| session);
		if let Some(pid) = session.process_id {
			self.watch_parent(pid);
		}
		self.lifecycle.initialized();
		Ok(result)
	}

	fn initialized(&self) -> HandlerResult<JsonValue> {
		let options = watcher_options(&self.cx.config().watch_glob);
		if let Err(err) = self.cx.producer().register_capability(
			WATCH_REGISTRATION,
			notification::DidChangeWatchedFiles::METHOD,
			Some(options),
		) {
			warn!(target: "lsp.lifecycle", error = %err, "file watcher registration failed");
		}
		self.handler.initialized(&self.cx)?;
		Ok(JsonValue::Null)
	}

	fn watch_parent(self: &Arc<Self>, pid: u32) {
		let server = Arc::downgrade(self);
		let interval = self.cx.config().probe_interval;
		let probe = LivenessProbe::start(pid, interval, self.process_probe.clone(), move || {
			if let Some(server) = server.upgrade() {
				server.exit();
			}
		});
		if let Some(previous) = self.probe.lock().replace(probe) {
			previous.stop();
		}
	}

	fn exit(&self) {
		let Some(code) = self.lifecycle.exit() else {
			debug!(target: "lsp.lifecycle", "repeated exit ignored");
			return;
		};
		if let Some(probe) = self.probe.lock().take() {
			probe.stop();
		}
		self.socket.close();
		info!(target: "lsp.lifecycle", code, "lsp.exit");
		(self.exit_hook)(code);
	}
}

impl<H: FeatureHandler> Service<AnyRequest> for Server<H> {
	type Response = Option<JsonValue>;
	type Error = ResponseError;
	type Future = ResponseFuture;

	fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: AnyRequest) -> Self::Future {
		self.inner.request(req)
	}
}

impl<H: FeatureHandler> LspService for Server<H> {
	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>> {
		self.inner.notify(notif)
	}
}
