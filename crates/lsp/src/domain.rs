//! Domain-shaped values exchanged with feature handlers.
//!
//! Handlers think in 1-based [`Point`]s (row, column) while the protocol counts lines and
//! characters from zero. Inbound params are translated while deserializing; outbound values
//! are translated by their [`IntoWire`] impls, which reject coordinates that are not 1-based.

use std::collections::{BTreeMap, HashMap};

use lsp_types::{
	ClientCapabilities, CodeActionKind, CompletionItemKind, DiagnosticSeverity, DocumentHighlightKind, FoldingRangeKind,
	InsertTextFormat, MarkupContent, MarkupKind, MessageType, NumberOrString, SymbolKind,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::coerce::{IntoWire, Shape, ShapeError, lenient, wire_uri};

/// A 0-based protocol position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WirePosition {
	/// Line, from zero.
	pub line: u32,
	/// Character offset, from zero.
	pub character: u32,
}

/// A 0-based, end-exclusive protocol range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WireRange {
	/// Inclusive start.
	pub start: WirePosition,
	/// Exclusive end.
	pub end: WirePosition,
}

/// A 1-based location inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "WirePosition")]
pub struct Point {
	/// Row, from one.
	pub row: u32,
	/// Column, from one.
	pub column: u32,
}

impl Point {
	/// Creates a point from 1-based coordinates.
	pub const fn new(row: u32, column: u32) -> Self {
		Self { row, column }
	}
}

impl Default for Point {
	fn default() -> Self {
		Self::new(1, 1)
	}
}

impl From<WirePosition> for Point {
	fn from(pos: WirePosition) -> Self {
		Self::new(pos.line.saturating_add(1), pos.character.saturating_add(1))
	}
}

impl IntoWire for Point {
	type Wire = lsp_types::Position;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		match (self.row.checked_sub(1), self.column.checked_sub(1)) {
			(Some(line), Some(character)) => Ok(lsp_types::Position { line, character }),
			_ => Err(ShapeError::new(format!(
				"point {}:{} is not 1-based",
				self.row, self.column
			))),
		}
	}
}

/// A 1-based, end-exclusive region of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "WireRange")]
pub struct Span {
	/// Inclusive start.
	pub start: Point,
	/// Exclusive end.
	pub end: Point,
}

impl Span {
	/// Creates a span.
	pub const fn new(start: Point, end: Point) -> Self {
		Self { start, end }
	}

	/// A span on one row.
	pub const fn on_row(row: u32, column: u32, end_column: u32) -> Self {
		Self::new(Point::new(row, column), Point::new(row, end_column))
	}
}

impl From<WireRange> for Span {
	fn from(range: WireRange) -> Self {
		Self::new(range.start.into(), range.end.into())
	}
}

impl IntoWire for Span {
	type Wire = lsp_types::Range;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		if self.end < self.start {
			return Err(ShapeError::new(format!(
				"span ends at {}:{} before it starts at {}:{}",
				self.end.row, self.end.column, self.start.row, self.start.column
			)));
		}
		Ok(lsp_types::Range {
			start: self.start.to_wire()?,
			end: self.end.to_wire()?,
		})
	}
}

/// A 1-based region where both ends are inclusive, as range computations expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowColRange {
	/// First row.
	pub row: u32,
	/// First column.
	pub col: u32,
	/// Last row.
	pub end_row: u32,
	/// Last column.
	pub end_col: u32,
}

impl From<WireRange> for RowColRange {
	fn from(range: WireRange) -> Self {
		Self {
			row: range.start.line.saturating_add(1),
			col: range.start.character.saturating_add(1),
			end_row: range.end.line.saturating_add(1),
			end_col: range.end.character.saturating_add(1),
		}
	}
}

// Inbound params. Every field defaults, so missing optional wire fields never fail.

/// Identifies a document by URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct DocumentId {
	/// Document URI as sent by the client.
	pub uri: String,
}

/// Params naming only a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentParams {
	/// Target document.
	pub text_document: DocumentId,
}

/// Params naming a point in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PositionParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Cursor location.
	pub position: Point,
}

/// How completion was triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionContext {
	/// 1 = invoked, 2 = trigger character, 3 = incomplete re-trigger; 0 when absent.
	pub trigger_kind: u32,
	/// The character that triggered completion, if any.
	pub trigger_character: Option<String>,
}

/// `textDocument/completion` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Cursor location.
	pub position: Point,
	/// Trigger details.
	#[serde(deserialize_with = "lenient")]
	pub context: CompletionContext,
}

/// `completionItem/resolve` params: the parts of an item needed to find it again.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolveCompletionParams {
	/// Label of the item to resolve.
	pub label: String,
	/// Opaque data attached when the item was produced.
	pub data: JsonValue,
}

/// Whether references include the declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceContext {
	/// Include the declaration site.
	pub include_declaration: bool,
}

/// `textDocument/references` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Cursor location.
	pub position: Point,
	/// Reference options.
	#[serde(deserialize_with = "lenient")]
	pub context: ReferenceContext,
}

/// `textDocument/rename` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenameParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Cursor location.
	pub position: Point,
	/// Replacement name.
	pub new_name: String,
}

/// Whitespace preferences for formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormattingOptions {
	/// Size of a tab in spaces.
	pub tab_size: u32,
	/// Prefer spaces over tabs.
	pub insert_spaces: bool,
}

impl Default for FormattingOptions {
	fn default() -> Self {
		Self {
			tab_size: 2,
			insert_spaces: true,
		}
	}
}

/// `textDocument/formatting` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormattingParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Whitespace preferences.
	#[serde(deserialize_with = "lenient")]
	pub options: FormattingOptions,
}

/// `textDocument/rangeFormatting` params as received.
///
/// The range stays in wire coordinates until the formatting latch is held, see
/// [`crate::formatting`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RangeFormattingParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Range to format, 0-based.
	pub range: WireRange,
	/// Whitespace preferences.
	#[serde(deserialize_with = "lenient")]
	pub options: FormattingOptions,
}

/// Range formatting input handed to the feature handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFormatting {
	/// Target document.
	pub text_document: DocumentId,
	/// Range to format, 1-based and inclusive on both ends.
	pub range: RowColRange,
	/// Whitespace preferences.
	pub options: FormattingOptions,
}

/// Diagnostics and kinds a code action request is scoped to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodeActionContext {
	/// Diagnostics overlapping the range, as sent by the client.
	pub diagnostics: Vec<JsonValue>,
	/// Requested action kinds; empty means all.
	pub only: Vec<String>,
}

/// `textDocument/codeAction` params.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeActionParams {
	/// Target document.
	pub text_document: DocumentId,
	/// Selected region.
	pub range: Span,
	/// Scope of the request.
	#[serde(deserialize_with = "lenient")]
	pub context: CodeActionContext,
}

/// `codeLens/resolve` params.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolveLensParams {
	/// Region of the lens.
	pub range: Span,
	/// Opaque data attached when the lens was produced.
	pub data: JsonValue,
}

/// A document as opened by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextDocumentItem {
	/// Document URI.
	pub uri: String,
	/// Language identifier.
	pub language_id: String,
	/// Version number.
	pub version: i32,
	/// Full text.
	pub text: String,
}

/// `textDocument/didOpen` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DidOpenParams {
	/// The opened document.
	pub text_document: TextDocumentItem,
}

/// A document URI with its version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersionedDocumentId {
	/// Document URI.
	pub uri: String,
	/// Version after the change.
	pub version: i32,
}

/// One content change; a missing range replaces the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentChange {
	/// Replaced region.
	pub range: Option<Span>,
	/// New text for the region.
	pub text: String,
}

/// `textDocument/didChange` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DidChangeParams {
	/// Changed document.
	pub text_document: VersionedDocumentId,
	/// Changes in application order.
	pub content_changes: Vec<ContentChange>,
}

/// `textDocument/didSave` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DidSaveParams {
	/// Saved document.
	pub text_document: DocumentId,
	/// Saved text, when the client includes it.
	pub text: Option<String>,
}

/// `workspace/executeCommand` params.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecuteCommandParams {
	/// Command identifier.
	pub command: String,
	/// Positional arguments.
	pub arguments: Vec<JsonValue>,
}

/// Kind of file system change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "u32")]
pub enum FileChange {
	/// The file was created.
	Created,
	/// The file was changed. Unknown kinds map here.
	#[default]
	Changed,
	/// The file was deleted.
	Deleted,
}

impl From<u32> for FileChange {
	fn from(kind: u32) -> Self {
		match kind {
			1 => Self::Created,
			3 => Self::Deleted,
			_ => Self::Changed,
		}
	}
}

/// One watched-file event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileEvent {
	/// Affected file.
	pub uri: String,
	/// What happened to it.
	#[serde(rename = "type")]
	pub kind: FileChange,
}

/// `workspace/didChangeWatchedFiles` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchedFilesParams {
	/// Events in the order they happened.
	pub changes: Vec<FileEvent>,
}

/// `workspace/didChangeConfiguration` params.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigurationParams {
	/// The new settings blob.
	pub settings: JsonValue,
}

/// `workspace/symbol` params.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceSymbolParams {
	/// Filter string.
	pub query: String,
}

/// `initialize` params.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitializeParams {
	/// Process id of the editor that started the server.
	#[serde(deserialize_with = "lenient")]
	pub process_id: Option<u32>,
	/// Workspace root.
	pub root_uri: Option<String>,
	/// Deprecated workspace root path, used when `root_uri` is absent.
	pub root_path: Option<String>,
	/// Declared client capabilities.
	#[serde(deserialize_with = "lenient")]
	pub capabilities: ClientCapabilities,
	/// Server settings chosen by the user.
	pub initialization_options: JsonValue,
	/// Token for reporting startup progress.
	#[serde(deserialize_with = "lenient")]
	pub work_done_token: Option<NumberOrString>,
}

// Outbound values.

/// A replacement of a span with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
	/// Replaced region.
	pub span: Span,
	/// Replacement text.
	pub new_text: String,
}

impl IntoWire for Edit {
	type Wire = lsp_types::TextEdit;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::TextEdit {
			range: self.span.to_wire()?,
			new_text: self.new_text.clone(),
		})
	}
}

/// Edits across documents, keyed by URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
	/// Edits per document.
	pub changes: BTreeMap<String, Vec<Edit>>,
}

impl ChangeSet {
	/// Adds edits for `uri`.
	#[must_use]
	pub fn with(mut self, uri: impl Into<String>, edits: Vec<Edit>) -> Self {
		self.changes.entry(uri.into()).or_default().extend(edits);
		self
	}
}

impl IntoWire for ChangeSet {
	type Wire = lsp_types::WorkspaceEdit;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		let mut changes = HashMap::with_capacity(self.changes.len());
		for (uri, edits) in &self.changes {
			changes.insert(wire_uri(uri)?, edits.to_wire()?);
		}
		Ok(lsp_types::WorkspaceEdit {
			changes: Some(changes),
			..Default::default()
		})
	}
}

/// A completion candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionEntry {
	/// Displayed label, inserted when nothing else is given.
	pub label: String,
	/// Candidate kind.
	pub kind: Option<CompletionItemKind>,
	/// Short detail line.
	pub detail: Option<String>,
	/// Markdown documentation.
	pub documentation: Option<String>,
	/// Text to insert instead of the label.
	pub insert_text: Option<String>,
	/// `insert_text` is a snippet.
	pub snippet: bool,
	/// Explicit edit replacing the label insertion.
	pub edit: Option<Edit>,
	/// Sort key.
	pub sort_text: Option<String>,
	/// Opaque data echoed back on resolve.
	pub data: Option<JsonValue>,
}

impl IntoWire for CompletionEntry {
	type Wire = lsp_types::CompletionItem;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::CompletionItem {
			label: self.label.clone(),
			kind: self.kind,
			detail: self.detail.clone(),
			documentation: self.documentation.clone().map(markdown_documentation),
			insert_text: self.insert_text.clone(),
			insert_text_format: self.snippet.then_some(InsertTextFormat::SNIPPET),
			text_edit: self
				.edit
				.as_ref()
				.map(IntoWire::to_wire)
				.transpose()?
				.map(lsp_types::CompletionTextEdit::Edit),
			sort_text: self.sort_text.clone(),
			data: self.data.clone(),
			..Default::default()
		})
	}
}

/// A completion result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
	/// Candidates.
	pub items: Vec<CompletionEntry>,
	/// More typing may produce different candidates.
	pub incomplete: bool,
}

impl IntoWire for Completion {
	type Wire = lsp_types::CompletionList;
	const SHAPE: Shape = Shape::CompletionList;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::CompletionList {
			is_incomplete: self.incomplete,
			items: self.items.to_wire()?,
		})
	}
}

/// Hover contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
	/// Markdown body.
	pub markdown: String,
	/// Region the hover applies to.
	pub span: Option<Span>,
}

impl IntoWire for HoverInfo {
	type Wire = lsp_types::Hover;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::Hover {
			contents: lsp_types::HoverContents::Markup(MarkupContent {
				kind: MarkupKind::Markdown,
				value: self.markdown.clone(),
			}),
			range: self.span.to_wire()?,
		})
	}
}

/// One callable signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureEntry {
	/// Full signature label.
	pub label: String,
	/// Markdown documentation.
	pub documentation: Option<String>,
	/// Parameter labels.
	pub parameters: Vec<String>,
}

/// Signature help result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
	/// Candidate signatures.
	pub signatures: Vec<SignatureEntry>,
	/// Index of the active signature.
	pub active_signature: Option<u32>,
	/// Index of the active parameter.
	pub active_parameter: Option<u32>,
}

impl IntoWire for Signatures {
	type Wire = lsp_types::SignatureHelp;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		let signatures = self
			.signatures
			.iter()
			.map(|sig| lsp_types::SignatureInformation {
				label: sig.label.clone(),
				documentation: sig.documentation.clone().map(markdown_documentation),
				parameters: Some(
					sig.parameters
						.iter()
						.map(|param| lsp_types::ParameterInformation {
							label: lsp_types::ParameterLabel::Simple(param.clone()),
							documentation: None,
						})
						.collect(),
				),
				active_parameter: None,
			})
			.collect();
		Ok(lsp_types::SignatureHelp {
			signatures,
			active_signature: self.active_signature,
			active_parameter: self.active_parameter,
		})
	}
}

/// A region inside some document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
	/// Document URI.
	pub uri: String,
	/// Region inside the document.
	pub span: Span,
}

impl IntoWire for SourceLocation {
	type Wire = lsp_types::Location;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::Location {
			uri: wire_uri(&self.uri)?,
			range: self.span.to_wire()?,
		})
	}
}

/// Access kind of a highlighted occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HighlightKind {
	/// Textual occurrence.
	#[default]
	Text,
	/// Read access.
	Read,
	/// Write access.
	Write,
}

/// A highlighted occurrence of the symbol under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
	/// Occurrence region.
	pub span: Span,
	/// Access kind.
	pub kind: HighlightKind,
}

impl IntoWire for Highlight {
	type Wire = lsp_types::DocumentHighlight;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		let kind = match self.kind {
			HighlightKind::Text => DocumentHighlightKind::TEXT,
			HighlightKind::Read => DocumentHighlightKind::READ,
			HighlightKind::Write => DocumentHighlightKind::WRITE,
		};
		Ok(lsp_types::DocumentHighlight {
			range: self.span.to_wire()?,
			kind: Some(kind),
		})
	}
}

/// A symbol defined in a document, possibly with nested symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
	/// Symbol name.
	pub name: String,
	/// Extra detail, eg. a signature.
	pub detail: Option<String>,
	/// Symbol kind.
	pub kind: SymbolKind,
	/// Full extent of the definition.
	pub span: Span,
	/// Extent of the name.
	pub selection_span: Span,
	/// Nested symbols.
	pub children: Vec<SymbolEntry>,
}

impl IntoWire for SymbolEntry {
	type Wire = lsp_types::DocumentSymbol;
	const SHAPE: Shape = Shape::Object;

	#[allow(deprecated, reason = "field is required by the struct literal")]
	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::DocumentSymbol {
			name: self.name.clone(),
			detail: self.detail.clone(),
			kind: self.kind,
			tags: None,
			deprecated: None,
			range: self.span.to_wire()?,
			selection_range: self.selection_span.to_wire()?,
			children: (!self.children.is_empty()).then(|| self.children.to_wire()).transpose()?,
		})
	}
}

/// A symbol found by a workspace-wide query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSymbolEntry {
	/// Symbol name.
	pub name: String,
	/// Symbol kind.
	pub kind: SymbolKind,
	/// Definition site.
	pub location: SourceLocation,
	/// Enclosing namespace or type.
	pub container: Option<String>,
}

impl IntoWire for WorkspaceSymbolEntry {
	type Wire = lsp_types::SymbolInformation;
	const SHAPE: Shape = Shape::Object;

	#[allow(deprecated, reason = "field is required by the struct literal")]
	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::SymbolInformation {
			name: self.name.clone(),
			kind: self.kind,
			tags: None,
			deprecated: None,
			location: self.location.to_wire()?,
			container_name: self.container.clone(),
		})
	}
}

/// A command the client can ask the server to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRef {
	/// Displayed title.
	pub title: String,
	/// Command identifier.
	pub command: String,
	/// Positional arguments.
	pub arguments: Vec<JsonValue>,
}

impl IntoWire for CommandRef {
	type Wire = lsp_types::Command;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::Command {
			title: self.title.clone(),
			command: self.command.clone(),
			arguments: (!self.arguments.is_empty()).then(|| self.arguments.clone()),
		})
	}
}

/// A code action offered for a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
	/// Displayed title.
	pub title: String,
	/// Action kind, eg. `quickfix` or `refactor.extract`.
	pub kind: Option<String>,
	/// Edits applied when chosen.
	pub changes: Option<ChangeSet>,
	/// Command run after the edits.
	pub command: Option<CommandRef>,
	/// Preferred among the offered actions.
	pub preferred: bool,
}

impl IntoWire for Action {
	type Wire = lsp_types::CodeActionOrCommand;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::CodeActionOrCommand::CodeAction(lsp_types::CodeAction {
			title: self.title.clone(),
			kind: self.kind.clone().map(CodeActionKind::from),
			edit: self.changes.to_wire()?,
			command: self.command.to_wire()?,
			is_preferred: self.preferred.then_some(true),
			..Default::default()
		}))
	}
}

/// A code lens anchored to a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lens {
	/// Anchor region.
	pub span: Span,
	/// Command shown, absent until resolved.
	pub command: Option<CommandRef>,
	/// Opaque data echoed back on resolve.
	pub data: Option<JsonValue>,
}

impl IntoWire for Lens {
	type Wire = lsp_types::CodeLens;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(lsp_types::CodeLens {
			range: self.span.to_wire()?,
			command: self.command.to_wire()?,
			data: self.data.clone(),
		})
	}
}

/// What a folding range folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
	/// A comment block.
	Comment,
	/// An import or require block.
	Imports,
	/// Any other region.
	Region,
}

/// A foldable row range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
	/// First row, 1-based.
	pub start_row: u32,
	/// Last row, 1-based.
	pub end_row: u32,
	/// Folded content kind.
	pub kind: Option<FoldKind>,
}

impl IntoWire for Fold {
	type Wire = lsp_types::FoldingRange;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		let (Some(start_line), Some(end_line)) = (self.start_row.checked_sub(1), self.end_row.checked_sub(1)) else {
			return Err(ShapeError::new(format!(
				"fold {}..{} is not 1-based",
				self.start_row, self.end_row
			)));
		};
		if end_line < start_line {
			return Err(ShapeError::new(format!(
				"fold ends at row {} before it starts at row {}",
				self.end_row, self.start_row
			)));
		}
		Ok(lsp_types::FoldingRange {
			start_line,
			end_line,
			kind: self.kind.map(|kind| match kind {
				FoldKind::Comment => FoldingRangeKind::Comment,
				FoldKind::Imports => FoldingRangeKind::Imports,
				FoldKind::Region => FoldingRangeKind::Region,
			}),
			..Default::default()
		})
	}
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	/// An error.
	#[default]
	Error,
	/// A warning.
	Warning,
	/// Informational.
	Info,
	/// A hint.
	Hint,
}

/// A diagnostic produced by analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finding {
	/// Affected region.
	pub span: Span,
	/// Severity.
	pub severity: Severity,
	/// Rule or error code.
	pub code: Option<String>,
	/// Producing tool.
	pub source: Option<String>,
	/// Human readable message.
	pub message: String,
}

impl IntoWire for Finding {
	type Wire = lsp_types::Diagnostic;
	const SHAPE: Shape = Shape::Object;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		let severity = match self.severity {
			Severity::Error => DiagnosticSeverity::ERROR,
			Severity::Warning => DiagnosticSeverity::WARNING,
			Severity::Info => DiagnosticSeverity::INFORMATION,
			Severity::Hint => DiagnosticSeverity::HINT,
		};
		Ok(lsp_types::Diagnostic {
			range: self.span.to_wire()?,
			severity: Some(severity),
			code: self.code.clone().map(NumberOrString::String),
			source: self.source.clone(),
			message: self.message.clone(),
			..Default::default()
		})
	}
}

/// Importance of a message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
	/// An error.
	Error,
	/// A warning.
	Warning,
	/// Information.
	Info,
	/// A log line.
	Log,
}

impl From<MessageKind> for MessageType {
	fn from(kind: MessageKind) -> Self {
		match kind {
			MessageKind::Error => Self::ERROR,
			MessageKind::Warning => Self::WARNING,
			MessageKind::Info => Self::INFO,
			MessageKind::Log => Self::LOG,
		}
	}
}

fn markdown_documentation(value: String) -> lsp_types::Documentation {
	lsp_types::Documentation::MarkupContent(MarkupContent {
		kind: MarkupKind::Markdown,
		value,
	})
}

#[cfg(test)]
mod tests;
