//! The feature-handler collaborator and the context it runs in.
//!
//! A [`FeatureHandler`] exposes one synchronous method per routing table entry. Methods may
//! run on any thread, concurrently with each other, so handler-owned state needs its own
//! synchronization.

use std::sync::{Arc, OnceLock};

use lsp_types::{ClientCapabilities, NumberOrString};
use serde_json::Value as JsonValue;

use crate::config::ServerConfig;
use crate::dispatch::{DomainError, HandlerResult};
use crate::domain::{
	Action, ChangeSet, CodeActionParams, Completion, CompletionEntry, CompletionParams, ConfigurationParams,
	DidChangeParams, DidOpenParams, DidSaveParams, DocumentParams, Edit, ExecuteCommandParams, Fold, FormattingParams,
	Highlight, HoverInfo, InitializeParams, Lens, PositionParams, RangeFormatting, ReferenceParams, RenameParams,
	ResolveCompletionParams, ResolveLensParams, Signatures, SourceLocation, Span, SymbolEntry, WatchedFilesParams,
	WorkspaceSymbolEntry, WorkspaceSymbolParams,
};
use crate::producer::Producer;

/// What the client told the server during `initialize`. Immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
	/// Workspace root.
	pub root_uri: Option<String>,
	/// Declared client capabilities.
	pub capabilities: ClientCapabilities,
	/// Settings blob from `initializationOptions`.
	pub settings: JsonValue,
	/// Process id of the editor, watched by the liveness probe. Never `Some(0)`.
	pub process_id: Option<u32>,
	/// Token for reporting startup progress.
	pub work_done_token: Option<NumberOrString>,
}

impl From<InitializeParams> for Session {
	fn from(params: InitializeParams) -> Self {
		let root_uri = params
			.root_uri
			.or_else(|| params.root_path.map(|path| format!("file://{path}")));
		Self {
			root_uri,
			capabilities: params.capabilities,
			settings: params.initialization_options,
			// A pid of 0 names no process.
			process_id: params.process_id.filter(|&pid| pid != 0),
			work_done_token: params.work_done_token,
		}
	}
}

/// State shared by every call.
#[derive(Debug)]
pub struct Context {
	producer: Producer,
	session: Arc<OnceLock<Session>>,
	config: ServerConfig,
}

impl Context {
	pub(crate) fn new(producer: Producer, session: Arc<OnceLock<Session>>, config: ServerConfig) -> Self {
		Self {
			producer,
			session,
			config,
		}
	}

	/// Outbound pushes to the client.
	pub fn producer(&self) -> &Producer {
		&self.producer
	}

	/// The session captured by `initialize`, absent before it.
	pub fn session(&self) -> Option<&Session> {
		self.session.get()
	}

	/// Server configuration.
	pub fn config(&self) -> &ServerConfig {
		&self.config
	}
}

/// Domain features behind the routing tables.
///
/// Requests default to a `MethodNotFound` error and notifications to doing nothing, so an
/// implementation only overrides what it supports.
#[allow(unused_variables, reason = "default bodies ignore their inputs")]
pub trait FeatureHandler: Send + Sync + 'static {
	/// Commands accepted by `workspace/executeCommand`.
	fn commands(&self) -> Vec<String> {
		Vec::new()
	}

	/// Runs before capabilities are returned, while [`Context::session`] is still absent.
	///
	/// An error or panic leaves the connection uninitialized, so the client may retry.
	fn initialize(&self, cx: &Context, session: &Session) -> HandlerResult<()> {
		Ok(())
	}

	/// Runs after the client confirmed initialization.
	fn initialized(&self, cx: &Context) -> HandlerResult<()> {
		Ok(())
	}

	/// Clears in-memory document state. The process keeps running until `exit`.
	fn shutdown(&self, cx: &Context) -> HandlerResult<()> {
		Ok(())
	}

	/// `textDocument/didOpen`
	fn did_open(&self, cx: &Context, params: DidOpenParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `textDocument/didChange`
	fn did_change(&self, cx: &Context, params: DidChangeParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `textDocument/didClose`
	fn did_close(&self, cx: &Context, params: DocumentParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `textDocument/didSave`
	fn did_save(&self, cx: &Context, params: DidSaveParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `textDocument/completion`
	fn completion(&self, cx: &Context, params: CompletionParams) -> HandlerResult<Completion> {
		Err(DomainError::method_not_found("textDocument/completion").into())
	}

	/// `completionItem/resolve`
	fn resolve_completion(&self, cx: &Context, params: ResolveCompletionParams) -> HandlerResult<CompletionEntry> {
		Err(DomainError::method_not_found("completionItem/resolve").into())
	}

	/// `textDocument/hover`
	fn hover(&self, cx: &Context, params: PositionParams) -> HandlerResult<Option<HoverInfo>> {
		Err(DomainError::method_not_found("textDocument/hover").into())
	}

	/// `textDocument/signatureHelp`
	fn signature_help(&self, cx: &Context, params: PositionParams) -> HandlerResult<Option<Signatures>> {
		Err(DomainError::method_not_found("textDocument/signatureHelp").into())
	}

	/// `textDocument/definition`
	fn definition(&self, cx: &Context, params: PositionParams) -> HandlerResult<Vec<SourceLocation>> {
		Err(DomainError::method_not_found("textDocument/definition").into())
	}

	/// `textDocument/declaration`
	fn declaration(&self, cx: &Context, params: PositionParams) -> HandlerResult<Vec<SourceLocation>> {
		Err(DomainError::method_not_found("textDocument/declaration").into())
	}

	/// `textDocument/implementation`
	fn implementation(&self, cx: &Context, params: PositionParams) -> HandlerResult<Vec<SourceLocation>> {
		Err(DomainError::method_not_found("textDocument/implementation").into())
	}

	/// `textDocument/references`
	fn references(&self, cx: &Context, params: ReferenceParams) -> HandlerResult<Vec<SourceLocation>> {
		Err(DomainError::method_not_found("textDocument/references").into())
	}

	/// `textDocument/documentHighlight`
	fn document_highlight(&self, cx: &Context, params: PositionParams) -> HandlerResult<Vec<Highlight>> {
		Err(DomainError::method_not_found("textDocument/documentHighlight").into())
	}

	/// `textDocument/documentSymbol`
	fn document_symbol(&self, cx: &Context, params: DocumentParams) -> HandlerResult<Vec<SymbolEntry>> {
		Err(DomainError::method_not_found("textDocument/documentSymbol").into())
	}

	/// `textDocument/formatting`
	fn formatting(&self, cx: &Context, params: FormattingParams) -> HandlerResult<Vec<Edit>> {
		Err(DomainError::method_not_found("textDocument/formatting").into())
	}

	/// `textDocument/rangeFormatting`, called with the formatting latch held.
	fn range_formatting(&self, cx: &Context, params: RangeFormatting) -> HandlerResult<Vec<Edit>> {
		Err(DomainError::method_not_found("textDocument/rangeFormatting").into())
	}

	/// `textDocument/codeAction`
	fn code_action(&self, cx: &Context, params: CodeActionParams) -> HandlerResult<Vec<Action>> {
		Err(DomainError::method_not_found("textDocument/codeAction").into())
	}

	/// `textDocument/codeLens`
	fn code_lens(&self, cx: &Context, params: DocumentParams) -> HandlerResult<Vec<Lens>> {
		Err(DomainError::method_not_found("textDocument/codeLens").into())
	}

	/// `codeLens/resolve`
	fn resolve_code_lens(&self, cx: &Context, params: ResolveLensParams) -> HandlerResult<Lens> {
		Err(DomainError::method_not_found("codeLens/resolve").into())
	}

	/// `textDocument/prepareRename`
	fn prepare_rename(&self, cx: &Context, params: PositionParams) -> HandlerResult<Option<Span>> {
		Err(DomainError::method_not_found("textDocument/prepareRename").into())
	}

	/// `textDocument/rename`
	fn rename(&self, cx: &Context, params: RenameParams) -> HandlerResult<Option<ChangeSet>> {
		Err(DomainError::method_not_found("textDocument/rename").into())
	}

	/// `textDocument/foldingRange`
	fn folding_range(&self, cx: &Context, params: DocumentParams) -> HandlerResult<Vec<Fold>> {
		Err(DomainError::method_not_found("textDocument/foldingRange").into())
	}

	/// `workspace/executeCommand`. Runs detached; the client was already answered.
	fn execute_command(&self, cx: &Context, params: ExecuteCommandParams) -> HandlerResult<()> {
		Err(DomainError::method_not_found("workspace/executeCommand").into())
	}

	/// `workspace/didChangeConfiguration`
	fn did_change_configuration(&self, cx: &Context, params: ConfigurationParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `workspace/didChangeWatchedFiles`
	fn did_change_watched_files(&self, cx: &Context, params: WatchedFilesParams) -> HandlerResult<()> {
		Ok(())
	}

	/// `workspace/symbol`
	fn workspace_symbol(&self, cx: &Context, params: WorkspaceSymbolParams) -> HandlerResult<Vec<WorkspaceSymbolEntry>> {
		Err(DomainError::method_not_found("workspace/symbol").into())
	}
}
