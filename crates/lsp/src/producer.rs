//! Server-initiated pushes.
//!
//! Every operation converts its payload through the strict outbound path of [`crate::coerce`]
//! before anything reaches the [`crate::Outbox`]. Delivery contracts differ per operation:
//!
//! | Operation | Acknowledgment |
//! |---|---|
//! | [`Producer::publish_diagnostics`] | none |
//! | [`Producer::refresh_code_lens`] | none, only sent when the client supports it |
//! | [`Producer::publish_workspace_edit`] | [`PendingReply`] with the client's verdict |
//! | [`Producer::show_document`] | [`PendingReply`], only sent when the client supports it |
//! | [`Producer::publish_progress`] | none |
//! | [`Producer::show_message_request`] | the chosen action, waited for without a timeout |
//! | [`Producer::show_message`] | none, mirrored to the log |
//! | [`Producer::register_capability`] / [`Producer::unregister_capability`] | not tracked |

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use lsp_types::notification::{Progress, ShowMessage};
use lsp_types::request::{
	ApplyWorkspaceEdit, CodeLensRefresh, RegisterCapability, Request, ShowDocument, ShowMessageRequest,
	UnregisterCapability, WorkDoneProgressCreate,
};
use lsp_types::{
	ApplyWorkspaceEditResponse, ClientCapabilities, MessageActionItem, NumberOrString, ProgressParams,
	ProgressParamsValue, Registration, RegistrationParams, ShowDocumentParams, ShowDocumentResult, ShowMessageParams,
	ShowMessageRequestParams, Unregistration, UnregistrationParams, WorkDoneProgress, WorkDoneProgressBegin,
	WorkDoneProgressCreateParams, WorkDoneProgressEnd, WorkDoneProgressReport,
};
use serde_json::{Map, Value as JsonValue, json};
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::coerce::{IntoWire, to_wire, wire_uri};
use crate::domain::{ChangeSet, Finding, MessageKind, Span};
use crate::handler::Session;
use crate::socket::{ClientSocket, PendingReply};

/// Last line of a whole-file selection; clients clamp it to the document.
const LAST_LINE: u32 = 2_147_483_647;

/// Sends server-initiated messages to the client.
///
/// Cheap to clone. Conditional pushes read the client capabilities captured by `initialize`
/// and treat a missing session as "not supported".
#[derive(Debug, Clone)]
pub struct Producer {
	socket: ClientSocket,
	session: Arc<OnceLock<Session>>,
	progress_token: String,
}

impl Producer {
	pub(crate) fn new(socket: ClientSocket, session: Arc<OnceLock<Session>>, progress_token: String) -> Self {
		Self {
			socket,
			session,
			progress_token,
		}
	}

	/// Client capabilities, once `initialize` was handled.
	pub fn capabilities(&self) -> Option<&ClientCapabilities> {
		self.session.get().map(|session| &session.capabilities)
	}

	/// Replaces the diagnostics of `uri`.
	///
	/// Findings without a wire form are logged and the document's diagnostics are cleared
	/// instead.
	///
	/// # Errors
	///
	/// `Error::Shape` for an invalid `uri`, `Error::ServiceStopped` when the connection is gone.
	pub fn publish_diagnostics(&self, uri: &str, version: Option<i32>, findings: Vec<Finding>) -> Result<()> {
		const METHOD: &str = "textDocument/publishDiagnostics";

		let mut params = Map::new();
		params.insert("uri".into(), serde_json::to_value(wire_uri(uri)?)?);
		params.insert("diagnostics".into(), to_wire(METHOD, &findings));
		if let Some(version) = version {
			params.insert("version".into(), version.into());
		}
		debug!(target: "lsp.producer", uri, count = findings.len(), "lsp.producer.diagnostics");
		self.socket.notify_value(METHOD, JsonValue::Object(params))
	}

	/// Asks the client to re-request code lenses.
	///
	/// Returns `false` without sending when the client did not declare refresh support.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn refresh_code_lens(&self) -> Result<bool> {
		let supported = self
			.capabilities()
			.and_then(|caps| caps.workspace.as_ref())
			.and_then(|workspace| workspace.code_lens.as_ref())
			.and_then(|code_lens| code_lens.refresh_support)
			.unwrap_or(false);
		if !supported {
			debug!(target: "lsp.producer", "code lens refresh not supported by client");
			return Ok(false);
		}
		drop(self.socket.request::<CodeLensRefresh>(())?);
		Ok(true)
	}

	/// Asks the client to apply `changes`.
	///
	/// The returned reply carries whether the client applied the edit; dropping it ignores
	/// the verdict.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn publish_workspace_edit(
		&self,
		label: Option<&str>,
		changes: &ChangeSet,
	) -> Result<PendingReply<ApplyWorkspaceEditResponse>> {
		let mut params = Map::new();
		if let Some(label) = label {
			params.insert("label".into(), label.into());
		}
		params.insert("edit".into(), to_wire(ApplyWorkspaceEdit::METHOD, changes));
		self.socket.request_value(ApplyWorkspaceEdit::METHOD, JsonValue::Object(params))
	}

	/// Asks the client to show `uri`, selecting `selection` or the whole document.
	///
	/// Returns `None` without sending when the client did not declare support.
	///
	/// # Errors
	///
	/// `Error::Shape` for an invalid `uri`, `Error::ServiceStopped` when the connection is gone.
	pub fn show_document(
		&self,
		uri: &str,
		selection: Option<Span>,
		take_focus: bool,
	) -> Result<Option<PendingReply<ShowDocumentResult>>> {
		let supported = self
			.capabilities()
			.and_then(|caps| caps.window.as_ref())
			.and_then(|window| window.show_document.as_ref())
			.is_some_and(|show_document| show_document.support);
		if !supported {
			debug!(target: "lsp.producer", uri, "show document not supported by client");
			return Ok(None);
		}

		let selection = match selection.map(|span| span.to_wire()) {
			Some(Ok(range)) => range,
			Some(Err(err)) => {
				warn!(target: "lsp.producer", uri, error = %err, "selection has no wire form, selecting whole file");
				whole_file()
			}
			None => whole_file(),
		};
		let params = ShowDocumentParams {
			uri: wire_uri(uri)?,
			external: Some(false),
			take_focus: Some(take_focus),
			selection: Some(selection),
		};
		Ok(Some(self.socket.request::<ShowDocument>(params)?))
	}

	/// Reports work-done progress under `token`, or the configured fallback token.
	///
	/// `percentage` 0 begins a sequence, 100 ends it and anything else reports an update.
	/// Beginning under the fallback token first asks the client to create it, without
	/// waiting for the answer.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn publish_progress(
		&self,
		token: Option<NumberOrString>,
		percentage: u32,
		title: &str,
		message: Option<&str>,
	) -> Result<()> {
		let fallback = token.is_none();
		let token = token.unwrap_or_else(|| NumberOrString::String(self.progress_token.clone()));
		let message = message.map(str::to_owned);
		let progress = match percentage {
			0 => {
				if fallback {
					drop(self.socket.request::<WorkDoneProgressCreate>(WorkDoneProgressCreateParams {
						token: token.clone(),
					})?);
				}
				WorkDoneProgress::Begin(WorkDoneProgressBegin {
					title: title.to_owned(),
					cancellable: Some(false),
					message,
					percentage: Some(0),
				})
			}
			100 => WorkDoneProgress::End(WorkDoneProgressEnd { message }),
			_ => WorkDoneProgress::Report(WorkDoneProgressReport {
				cancellable: Some(false),
				message,
				percentage: Some(percentage.min(100)),
			}),
		};
		self.socket.notify::<Progress>(ProgressParams {
			token,
			value: ProgressParamsValue::WorkDone(progress),
		})
	}

	/// Shows `message` with `actions` and waits for the label of the chosen one.
	///
	/// `None` means the client dismissed the message. There is no timeout.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection closes first, `Error::Response` when the
	/// client answers with an error.
	pub async fn show_message_request(&self, kind: MessageKind, message: &str, actions: &[&str]) -> Result<Option<String>> {
		let reply = self.send_message_request(kind, message, actions)?;
		Ok(reply.recv().await?.map(|action| action.title))
	}

	/// Blocking form of [`Producer::show_message_request`] for handler threads.
	///
	/// # Errors
	///
	/// Same as [`Producer::show_message_request`].
	pub fn show_message_request_blocking(
		&self,
		kind: MessageKind,
		message: &str,
		actions: &[&str],
	) -> Result<Option<String>> {
		let reply = self.send_message_request(kind, message, actions)?;
		Ok(reply.blocking_recv()?.map(|action| action.title))
	}

	fn send_message_request(
		&self,
		kind: MessageKind,
		message: &str,
		actions: &[&str],
	) -> Result<PendingReply<Option<MessageActionItem>>> {
		let actions = actions
			.iter()
			.map(|title| MessageActionItem {
				title: (*title).to_owned(),
				properties: HashMap::new(),
			})
			.collect();
		self.socket.request::<ShowMessageRequest>(ShowMessageRequestParams {
			typ: kind.into(),
			message: message.to_owned(),
			actions: Some(actions),
		})
	}

	/// Shows `message` to the user and mirrors it to the log.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn show_message(&self, kind: MessageKind, message: &str) -> Result<()> {
		match kind {
			MessageKind::Error => error!(target: "lsp.producer", message, "lsp.producer.show_message"),
			MessageKind::Warning => warn!(target: "lsp.producer", message, "lsp.producer.show_message"),
			MessageKind::Info => info!(target: "lsp.producer", message, "lsp.producer.show_message"),
			MessageKind::Log => debug!(target: "lsp.producer", message, "lsp.producer.show_message"),
		}
		self.socket.notify::<ShowMessage>(ShowMessageParams {
			typ: kind.into(),
			message: message.to_owned(),
		})
	}

	/// Registers `method` dynamically under `id`.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn register_capability(&self, id: &str, method: &str, options: Option<JsonValue>) -> Result<()> {
		debug!(target: "lsp.producer", id, method, "lsp.producer.register");
		drop(self.socket.request::<RegisterCapability>(RegistrationParams {
			registrations: vec![Registration {
				id: id.to_owned(),
				method: method.to_owned(),
				register_options: options,
			}],
		})?);
		Ok(())
	}

	/// Drops the registration `id` of `method`.
	///
	/// # Errors
	///
	/// `Error::ServiceStopped` when the connection is gone.
	pub fn unregister_capability(&self, id: &str, method: &str) -> Result<()> {
		debug!(target: "lsp.producer", id, method, "lsp.producer.unregister");
		drop(self.socket.request::<UnregisterCapability>(UnregistrationParams {
			unregisterations: vec![Unregistration {
				id: id.to_owned(),
				method: method.to_owned(),
			}],
		})?);
		Ok(())
	}
}

/// Register options watching `glob` for creations, changes and deletions.
pub(crate) fn watcher_options(glob: &str) -> JsonValue {
	json!({ "watchers": [{ "globPattern": glob }] })
}

fn whole_file() -> lsp_types::Range {
	lsp_types::Range::new(lsp_types::Position::new(0, 0), lsp_types::Position::new(LAST_LINE, 0))
}

#[cfg(test)]
mod tests;
