use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::coerce::to_domain;

#[test]
fn range_formatting_translation_adds_one_everywhere() {
	let wire = WireRange {
		start: WirePosition { line: 0, character: 0 },
		end: WirePosition { line: 4, character: 12 },
	};
	assert_eq!(
		RowColRange::from(wire),
		RowColRange {
			row: 1,
			col: 1,
			end_row: 5,
			end_col: 13,
		}
	);
}

#[test]
fn point_round_trips_through_wire_coordinates() {
	let point = Point::from(WirePosition { line: 9, character: 2 });
	assert_eq!(point, Point::new(10, 3));
	assert_eq!(point.to_wire().unwrap(), lsp_types::Position::new(9, 2));
}

#[test]
fn zero_coordinates_do_not_convert() {
	assert!(Point::new(0, 1).to_wire().is_err());
	assert!(Point::new(1, 0).to_wire().is_err());
}

#[test]
fn content_change_without_range_replaces_document() {
	let params: DidChangeParams = to_domain(
		"textDocument/didChange",
		json!({
			"textDocument": { "uri": "file:///proj/a.clj", "version": 3 },
			"contentChanges": [
				{ "text": "(ns a)" },
				{ "range": { "start": { "line": 0, "character": 4 }, "end": { "line": 0, "character": 5 } }, "text": "b" },
			],
		}),
	);
	assert_eq!(params.text_document.version, 3);
	assert_eq!(params.content_changes[0].range, None);
	assert_eq!(params.content_changes[1].range, Some(Span::on_row(1, 5, 6)));
}

#[test]
fn watched_file_kinds() {
	let params: WatchedFilesParams = to_domain(
		"workspace/didChangeWatchedFiles",
		json!({ "changes": [
			{ "uri": "file:///proj/a.clj", "type": 1 },
			{ "uri": "file:///proj/b.clj", "type": 2 },
			{ "uri": "file:///proj/c.clj", "type": 3 },
			{ "uri": "file:///proj/d.clj", "type": 9 },
		] }),
	);
	let kinds: Vec<_> = params.changes.iter().map(|event| event.kind).collect();
	assert_eq!(
		kinds,
		[
			FileChange::Created,
			FileChange::Changed,
			FileChange::Deleted,
			FileChange::Changed
		]
	);
}

#[test]
fn initialize_accepts_empty_capabilities() {
	let params: InitializeParams = to_domain(
		"initialize",
		json!({ "rootUri": "file:///proj", "capabilities": {}, "processId": 4242 }),
	);
	assert_eq!(params.root_uri.as_deref(), Some("file:///proj"));
	assert_eq!(params.process_id, Some(4242));
	assert_eq!(params.capabilities, ClientCapabilities::default());
	assert!(params.initialization_options.is_null());
}

#[test]
fn change_set_groups_edits_by_document() {
	let changes = ChangeSet::default()
		.with(
			"file:///proj/a.clj",
			vec![Edit {
				span: Span::on_row(2, 1, 4),
				new_text: "bar".into(),
			}],
		)
		.with(
			"file:///proj/a.clj",
			vec![Edit {
				span: Span::on_row(3, 1, 4),
				new_text: "baz".into(),
			}],
		);
	let wire = serde_json::to_value(changes.to_wire().unwrap()).unwrap();
	assert_eq!(
		wire,
		json!({ "changes": { "file:///proj/a.clj": [
			{ "range": { "start": { "line": 1, "character": 0 }, "end": { "line": 1, "character": 3 } }, "newText": "bar" },
			{ "range": { "start": { "line": 2, "character": 0 }, "end": { "line": 2, "character": 3 } }, "newText": "baz" },
		] } })
	);
}

#[test]
fn change_set_with_bad_uri_does_not_convert() {
	let changes = ChangeSet::default().with("::", Vec::new());
	assert!(changes.to_wire().is_err());
}

#[test]
fn fold_rows_are_zero_based_on_the_wire() {
	let fold = Fold {
		start_row: 3,
		end_row: 7,
		kind: Some(FoldKind::Comment),
	};
	let wire = fold.to_wire().unwrap();
	assert_eq!((wire.start_line, wire.end_line), (2, 6));
	assert_eq!(wire.kind, Some(FoldingRangeKind::Comment));

	let reversed = Fold {
		start_row: 7,
		end_row: 3,
		kind: None,
	};
	assert!(reversed.to_wire().is_err());
}

#[test]
fn nested_symbols_convert_recursively() {
	let leaf = SymbolEntry {
		name: "inner".into(),
		detail: None,
		kind: SymbolKind::FUNCTION,
		span: Span::on_row(2, 3, 10),
		selection_span: Span::on_row(2, 8, 10),
		children: Vec::new(),
	};
	let root = SymbolEntry {
		name: "outer".into(),
		detail: Some("(outer x)".into()),
		kind: SymbolKind::NAMESPACE,
		span: Span::new(Point::new(1, 1), Point::new(3, 1)),
		selection_span: Span::on_row(1, 5, 10),
		children: vec![leaf.clone()],
	};
	let wire = root.to_wire().unwrap();
	let children = wire.children.unwrap();
	assert_eq!(children.len(), 1);
	assert_eq!(children[0].range, lsp_types::Range::new(lsp_types::Position::new(1, 2), lsp_types::Position::new(1, 9)));
	assert!(children[0].children.is_none());

	let broken = SymbolEntry {
		children: vec![SymbolEntry {
			span: Span::on_row(0, 1, 1),
			..leaf
		}],
		..root
	};
	assert!(broken.to_wire().is_err());
}

#[test]
fn finding_maps_severity_and_code() {
	let finding = Finding {
		span: Span::on_row(1, 1, 2),
		severity: Severity::Warning,
		code: Some("unused-binding".into()),
		source: Some("tessel".into()),
		message: "unused binding x".into(),
	};
	let wire = finding.to_wire().unwrap();
	assert_eq!(wire.severity, Some(DiagnosticSeverity::WARNING));
	assert_eq!(wire.code, Some(NumberOrString::String("unused-binding".into())));
}

#[test]
fn message_kinds_map_to_protocol_types() {
	assert_eq!(MessageType::from(MessageKind::Error), MessageType::ERROR);
	assert_eq!(MessageType::from(MessageKind::Log), MessageType::LOG);
}
