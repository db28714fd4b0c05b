//! Declarative routing tables.
//!
//! Each [`Route`] binds a method name to a [`FeatureHandler`] operation plus dispatch
//! policy: the expected result [`Shape`], the execution [`Mode`] and an optional result
//! [`Summarizer`]. Routes carry no business logic; coercion in and out is composed around the
//! handler call when the table is built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lsp_types::notification::{self, Notification};
use lsp_types::request::{self, Request};
use lsp_types::{
	CodeActionProviderCapability, CodeLensOptions, CompletionOptions, DeclarationCapability, ExecuteCommandOptions,
	FoldingRangeProviderCapability, HoverProviderCapability, ImplementationProviderCapability, OneOf, RenameOptions,
	SaveOptions, ServerCapabilities, SignatureHelpOptions, TextDocumentSyncCapability, TextDocumentSyncKind,
	TextDocumentSyncOptions, TextDocumentSyncSaveOptions,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::coerce::{IntoWire, Shape, to_domain, to_wire};
use crate::config::ServerConfig;
use crate::dispatch::{self, Call, CallKind, HandlerResult, Mode, ResponseFuture, Summarizer};
use crate::formatting::{FormattingLatch, format_range};
use crate::handler::{Context, FeatureHandler};

/// Which surface a route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// Operations on one document.
	Document,
	/// Operations on the workspace as a whole.
	Workspace,
}

type Body<H> = Arc<dyn Fn(&H, &Context, JsonValue) -> HandlerResult<JsonValue> + Send + Sync>;

/// One routing table entry.
pub struct Route<H> {
	/// Method name.
	pub method: &'static str,
	/// Surface the route belongs to.
	pub scope: Scope,
	/// Request or notification.
	pub kind: CallKind,
	/// Shape of the response, `None` for notifications.
	pub shape: Option<Shape>,
	/// Execution mode.
	pub mode: Mode,
	/// Describes results in the per-call log record.
	pub summarize: Option<Summarizer>,
	body: Body<H>,
}

impl<H> Clone for Route<H> {
	fn clone(&self) -> Self {
		Self {
			method: self.method,
			scope: self.scope,
			kind: self.kind,
			shape: self.shape,
			mode: self.mode,
			summarize: self.summarize,
			body: self.body.clone(),
		}
	}
}

impl<H> fmt::Debug for Route<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("method", &self.method)
			.field("scope", &self.scope)
			.field("kind", &self.kind)
			.field("shape", &self.shape)
			.field("mode", &self.mode)
			.finish_non_exhaustive()
	}
}

impl<H: FeatureHandler> Route<H> {
	/// Runs `call` through the dispatch wrapper under this route's policy.
	pub fn dispatch(&self, handler: Arc<H>, cx: Arc<Context>, mut call: Call) -> ResponseFuture {
		let params = std::mem::take(&mut call.params);
		let body = self.body.clone();
		dispatch::run(call, self.mode, self.summarize, move || body(&handler, &cx, params))
	}
}

fn request_route<H, P, D>(
	method: &'static str,
	scope: Scope,
	mode: Mode,
	summarize: Option<Summarizer>,
	op: fn(&H, &Context, P) -> HandlerResult<D>,
) -> Route<H>
where
	H: FeatureHandler,
	P: DeserializeOwned + Default + 'static,
	D: IntoWire + 'static,
{
	Route {
		method,
		scope,
		kind: CallKind::Request,
		shape: Some(D::SHAPE),
		mode,
		summarize,
		body: Arc::new(move |handler: &H, cx: &Context, params: JsonValue| {
			let result = op(handler, cx, to_domain(method, params))?;
			Ok(to_wire(method, &result))
		}),
	}
}

fn notification_route<H, P>(method: &'static str, scope: Scope, mode: Mode, op: fn(&H, &Context, P) -> HandlerResult<()>) -> Route<H>
where
	H: FeatureHandler,
	P: DeserializeOwned + Default + 'static,
{
	Route {
		method,
		scope,
		kind: CallKind::Notification,
		shape: None,
		mode,
		summarize: None,
		body: Arc::new(move |handler: &H, cx: &Context, params: JsonValue| {
			op(handler, cx, to_domain(method, params))?;
			Ok(JsonValue::Null)
		}),
	}
}

fn range_formatting<H: FeatureHandler>(latch: Arc<FormattingLatch>) -> Route<H> {
	const METHOD: &str = request::RangeFormatting::METHOD;
	Route {
		method: METHOD,
		scope: Scope::Document,
		kind: CallKind::Request,
		shape: Some(Shape::Sequence),
		mode: Mode::Sync,
		summarize: Some(count),
		body: Arc::new(move |handler: &H, cx: &Context, params: JsonValue| {
			Ok(format_range(&latch, to_domain(METHOD, params), |input| {
				handler.range_formatting(cx, input)
			}))
		}),
	}
}

/// Summarizes a sequence result by its length.
pub fn count(value: &JsonValue) -> String {
	format!("{} items", value.as_array().map_or(0, Vec::len))
}

/// Summarizes a completion list by its item count.
pub fn completion_count(value: &JsonValue) -> String {
	count(&value["items"])
}

/// Document-scoped operations.
pub fn document_table<H: FeatureHandler>(latch: Arc<FormattingLatch>) -> Vec<Route<H>> {
	use Mode::{Async, Detached, Sync};
	use Scope::Document;

	vec![
		notification_route(notification::DidOpenTextDocument::METHOD, Document, Sync, H::did_open),
		notification_route(notification::DidChangeTextDocument::METHOD, Document, Sync, H::did_change),
		notification_route(notification::DidCloseTextDocument::METHOD, Document, Sync, H::did_close),
		notification_route(notification::DidSaveTextDocument::METHOD, Document, Detached, H::did_save),
		request_route(request::Completion::METHOD, Document, Async, Some(completion_count), H::completion),
		request_route(request::ResolveCompletionItem::METHOD, Document, Async, None, H::resolve_completion),
		request_route(request::HoverRequest::METHOD, Document, Async, None, H::hover),
		request_route(request::SignatureHelpRequest::METHOD, Document, Async, None, H::signature_help),
		request_route(request::GotoDefinition::METHOD, Document, Async, Some(count), H::definition),
		request_route(request::GotoDeclaration::METHOD, Document, Async, Some(count), H::declaration),
		request_route(request::GotoImplementation::METHOD, Document, Async, Some(count), H::implementation),
		request_route(request::References::METHOD, Document, Async, Some(count), H::references),
		request_route(request::DocumentHighlightRequest::METHOD, Document, Async, Some(count), H::document_highlight),
		request_route(request::DocumentSymbolRequest::METHOD, Document, Async, Some(count), H::document_symbol),
		request_route(request::Formatting::METHOD, Document, Async, Some(count), H::formatting),
		range_formatting(latch),
		request_route(request::CodeActionRequest::METHOD, Document, Async, Some(count), H::code_action),
		request_route(request::CodeLensRequest::METHOD, Document, Async, Some(count), H::code_lens),
		request_route(request::CodeLensResolve::METHOD, Document, Async, None, H::resolve_code_lens),
		request_route(request::PrepareRenameRequest::METHOD, Document, Async, None, H::prepare_rename),
		request_route(request::Rename::METHOD, Document, Async, None, H::rename),
		request_route(request::FoldingRangeRequest::METHOD, Document, Async, Some(count), H::folding_range),
	]
}

/// Workspace-scoped operations.
pub fn workspace_table<H: FeatureHandler>() -> Vec<Route<H>> {
	use Mode::{Async, Detached, Sync};
	use Scope::Workspace;

	vec![
		request_route(request::ExecuteCommand::METHOD, Workspace, Detached, None, H::execute_command),
		notification_route(notification::DidChangeConfiguration::METHOD, Workspace, Sync, H::did_change_configuration),
		notification_route(notification::DidChangeWatchedFiles::METHOD, Workspace, Detached, H::did_change_watched_files),
		request_route(request::WorkspaceSymbolRequest::METHOD, Workspace, Async, Some(count), H::workspace_symbol),
	]
}

/// Both tables, indexed by method.
pub struct Router<H> {
	routes: HashMap<&'static str, Route<H>>,
}

impl<H> fmt::Debug for Router<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router").field("routes", &self.routes.len()).finish()
	}
}

impl<H: FeatureHandler> Router<H> {
	/// Builds the document and workspace tables. Range formatting runs under `latch`.
	pub fn new(latch: Arc<FormattingLatch>) -> Self {
		let routes = document_table(latch)
			.into_iter()
			.chain(workspace_table())
			.map(|route| (route.method, route))
			.collect();
		Self { routes }
	}

	/// The route for `method`, if any.
	pub fn get(&self, method: &str) -> Option<&Route<H>> {
		self.routes.get(method)
	}

	/// All routes, in no particular order.
	pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
		self.routes.values()
	}

	/// The capability descriptor implied by the tables.
	pub fn server_capabilities(&self, config: &ServerConfig, commands: Vec<String>) -> ServerCapabilities {
		let has = |method: &str| self.routes.contains_key(method);
		let mut caps = ServerCapabilities::default();
		for route in self.routes.values() {
			match route.method {
				notification::DidOpenTextDocument::METHOD
				| notification::DidChangeTextDocument::METHOD
				| notification::DidCloseTextDocument::METHOD
				| notification::DidSaveTextDocument::METHOD => {
					caps.text_document_sync = Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
						open_close: Some(true),
						change: Some(TextDocumentSyncKind::INCREMENTAL),
						save: has(notification::DidSaveTextDocument::METHOD).then_some(
							TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
								include_text: Some(true),
							}),
						),
						..Default::default()
					}));
				}
				request::Completion::METHOD => {
					caps.completion_provider = Some(CompletionOptions {
						resolve_provider: Some(has(request::ResolveCompletionItem::METHOD)),
						trigger_characters: Some(config.completion_triggers.clone()),
						..Default::default()
					});
				}
				request::HoverRequest::METHOD => {
					caps.hover_provider = Some(HoverProviderCapability::Simple(true));
				}
				request::SignatureHelpRequest::METHOD => {
					caps.signature_help_provider = Some(SignatureHelpOptions {
						trigger_characters: Some(config.signature_triggers.clone()),
						..Default::default()
					});
				}
				request::GotoDefinition::METHOD => caps.definition_provider = Some(OneOf::Left(true)),
				request::GotoDeclaration::METHOD => {
					caps.declaration_provider = Some(DeclarationCapability::Simple(true));
				}
				request::GotoImplementation::METHOD => {
					caps.implementation_provider = Some(ImplementationProviderCapability::Simple(true));
				}
				request::References::METHOD => caps.references_provider = Some(OneOf::Left(true)),
				request::DocumentHighlightRequest::METHOD => {
					caps.document_highlight_provider = Some(OneOf::Left(true));
				}
				request::DocumentSymbolRequest::METHOD => caps.document_symbol_provider = Some(OneOf::Left(true)),
				request::Formatting::METHOD => caps.document_formatting_provider = Some(OneOf::Left(true)),
				request::RangeFormatting::METHOD => caps.document_range_formatting_provider = Some(OneOf::Left(true)),
				request::CodeActionRequest::METHOD => {
					caps.code_action_provider = Some(CodeActionProviderCapability::Simple(true));
				}
				request::CodeLensRequest::METHOD => {
					caps.code_lens_provider = Some(CodeLensOptions {
						resolve_provider: Some(has(request::CodeLensResolve::METHOD)),
					});
				}
				request::Rename::METHOD => {
					caps.rename_provider = Some(OneOf::Right(RenameOptions {
						prepare_provider: Some(has(request::PrepareRenameRequest::METHOD)),
						work_done_progress_options: Default::default(),
					}));
				}
				request::FoldingRangeRequest::METHOD => {
					caps.folding_range_provider = Some(FoldingRangeProviderCapability::Simple(true));
				}
				request::ExecuteCommand::METHOD => {
					caps.execute_command_provider = Some(ExecuteCommandOptions {
						commands: commands.clone(),
						work_done_progress_options: Default::default(),
					});
				}
				request::WorkspaceSymbolRequest::METHOD => caps.workspace_symbol_provider = Some(OneOf::Left(true)),
				_ => {}
			}
		}
		caps
	}
}
