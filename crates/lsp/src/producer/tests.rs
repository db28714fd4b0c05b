use pretty_assertions::assert_eq;

use super::*;
use crate::domain::{Edit, Point, Severity};
use crate::socket::{Outbound, Outbox};
use crate::types::AnyResponse;

fn producer_with(capabilities: JsonValue) -> (Producer, Outbox, ClientSocket) {
	let (socket, outbox) = ClientSocket::new();
	let session = Arc::new(OnceLock::new());
	let _ = session.set(Session {
		capabilities: serde_json::from_value(capabilities).unwrap(),
		..Default::default()
	});
	let producer = Producer::new(socket.clone(), session, "tessel/progress".into());
	(producer, outbox, socket)
}

fn drain(outbox: &mut Outbox) -> Vec<Outbound> {
	std::iter::from_fn(|| outbox.try_recv().ok()).collect()
}

fn finding(row: u32) -> Finding {
	Finding {
		span: Span::on_row(row, 1, 4),
		severity: Severity::Warning,
		message: "unused binding".into(),
		..Default::default()
	}
}

#[test]
fn diagnostics_are_pushed_without_reply() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	producer
		.publish_diagnostics("file:///proj/a.clj", Some(4), vec![finding(2)])
		.unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent.len(), 1);
	assert!(matches!(&sent[0], Outbound::Notification(_)));
	assert_eq!(sent[0].method(), "textDocument/publishDiagnostics");
	assert_eq!(
		sent[0].params(),
		&json!({
			"uri": "file:///proj/a.clj",
			"version": 4,
			"diagnostics": [{
				"range": { "start": { "line": 1, "character": 0 }, "end": { "line": 1, "character": 3 } },
				"severity": 2,
				"message": "unused binding",
			}],
		})
	);
	assert_eq!(socket.pending(), 0);
}

#[test]
fn malformed_finding_clears_diagnostics() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	producer
		.publish_diagnostics("file:///proj/a.clj", None, vec![finding(2), finding(0)])
		.unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent[0].params()["diagnostics"], json!([]));
	assert!(sent[0].params().get("version").is_none());
}

#[test]
fn invalid_uri_is_not_pushed() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	assert!(matches!(
		producer.publish_diagnostics("not a uri", None, Vec::new()),
		Err(crate::Error::Shape(_))
	));
	assert!(drain(&mut outbox).is_empty());
}

#[test]
fn code_lens_refresh_needs_client_support() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	assert!(!producer.refresh_code_lens().unwrap());
	assert!(drain(&mut outbox).is_empty());

	let (producer, mut outbox, _socket) = producer_with(json!({ "workspace": { "codeLens": { "refreshSupport": true } } }));
	assert!(producer.refresh_code_lens().unwrap());
	let sent = drain(&mut outbox);
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].method(), "workspace/codeLens/refresh");
}

#[test]
fn progress_sequence_begins_reports_and_ends() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	producer.publish_progress(None, 0, "Analyzing", None).unwrap();
	producer.publish_progress(None, 55, "Analyzing", Some("src/a.clj")).unwrap();
	producer.publish_progress(None, 100, "Analyzing", None).unwrap();

	let sent = drain(&mut outbox);
	let methods: Vec<_> = sent.iter().map(Outbound::method).collect();
	assert_eq!(
		methods,
		["window/workDoneProgress/create", "$/progress", "$/progress", "$/progress"]
	);
	assert_eq!(sent[0].params(), &json!({ "token": "tessel/progress" }));

	let kinds: Vec<_> = sent[1..].iter().map(|msg| msg.params()["value"]["kind"].clone()).collect();
	assert_eq!(kinds, [json!("begin"), json!("report"), json!("end")]);
	assert!(sent[1..].iter().all(|msg| msg.params()["token"] == "tessel/progress"));
	assert_eq!(sent[2].params()["value"]["percentage"], 55);
	assert_eq!(sent[2].params()["value"]["message"], "src/a.clj");
}

#[test]
fn explicit_progress_token_is_not_created() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	producer
		.publish_progress(Some(NumberOrString::Number(7)), 0, "Indexing", None)
		.unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].params()["token"], 7);
}

#[test]
fn show_document_needs_client_support() {
	let (producer, mut outbox, _socket) = producer_with(json!({}));
	assert!(producer.show_document("file:///proj/a.clj", None, true).unwrap().is_none());
	assert!(drain(&mut outbox).is_empty());
}

#[tokio::test]
async fn show_document_defaults_to_whole_file() {
	let (producer, mut outbox, socket) = producer_with(json!({ "window": { "showDocument": { "support": true } } }));
	let reply = producer
		.show_document("file:///proj/a.clj", None, true)
		.unwrap()
		.expect("supported");
	let sent = drain(&mut outbox);
	assert_eq!(
		sent[0].params()["selection"],
		json!({ "start": { "line": 0, "character": 0 }, "end": { "line": 2147483647, "character": 0 } })
	);

	let Outbound::Request(req) = &sent[0] else {
		panic!("show document is a request");
	};
	socket.complete(AnyResponse {
		id: req.id.clone(),
		result: Some(json!({ "success": true })),
		error: None,
	});
	assert!(reply.recv().await.unwrap().success);
}

#[tokio::test]
async fn show_document_keeps_explicit_selection() {
	let (producer, mut outbox, _socket) = producer_with(json!({ "window": { "showDocument": { "support": true } } }));
	let _reply = producer
		.show_document("file:///proj/a.clj", Some(Span::on_row(3, 2, 5)), false)
		.unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(
		sent[0].params()["selection"],
		json!({ "start": { "line": 2, "character": 1 }, "end": { "line": 2, "character": 4 } })
	);
	assert_eq!(sent[0].params()["takeFocus"], false);
}

#[tokio::test]
async fn workspace_edit_verdict_is_inspectable() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	let changes = ChangeSet::default().with(
		"file:///proj/a.clj",
		vec![Edit {
			span: Span::new(Point::new(1, 1), Point::new(1, 4)),
			new_text: "foo".into(),
		}],
	);
	let reply = producer.publish_workspace_edit(Some("Rename"), &changes).unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent[0].method(), "workspace/applyEdit");
	assert_eq!(sent[0].params()["label"], "Rename");
	assert!(sent[0].params()["edit"]["changes"]["file:///proj/a.clj"].is_array());

	let Outbound::Request(req) = &sent[0] else {
		panic!("apply edit is a request");
	};
	socket.complete(AnyResponse {
		id: req.id.clone(),
		result: Some(json!({ "applied": false, "failureReason": "file is read-only" })),
		error: None,
	});
	let verdict = reply.recv().await.unwrap();
	assert!(!verdict.applied);
	assert_eq!(verdict.failure_reason.as_deref(), Some("file is read-only"));
}

#[tokio::test]
async fn message_request_returns_chosen_action() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	let answer = tokio::spawn({
		let producer = producer.clone();
		async move {
			producer
				.show_message_request(MessageKind::Warning, "Project changed, re-analyze?", &["Yes", "No"])
				.await
		}
	});

	let req = loop {
		if let Some(Outbound::Request(req)) = drain(&mut outbox).into_iter().next() {
			break req;
		}
		tokio::task::yield_now().await;
	};
	assert_eq!(req.method, "window/showMessageRequest");
	assert_eq!(req.params["actions"], json!([{ "title": "Yes" }, { "title": "No" }]));
	socket.complete(AnyResponse {
		id: req.id,
		result: Some(json!({ "title": "Yes" })),
		error: None,
	});
	assert_eq!(answer.await.unwrap().unwrap().as_deref(), Some("Yes"));
}

#[test]
fn dismissed_message_request_is_none() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	let waiter = std::thread::spawn(move || producer.show_message_request_blocking(MessageKind::Info, "Hi", &["Ok"]));
	let req = loop {
		if let Some(Outbound::Request(req)) = drain(&mut outbox).into_iter().next() {
			break req;
		}
		std::thread::yield_now();
	};
	socket.complete(AnyResponse {
		id: req.id,
		result: Some(JsonValue::Null),
		error: None,
	});
	assert_eq!(waiter.join().unwrap().unwrap(), None);
}

#[test]
fn show_message_is_fire_and_forget() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	producer.show_message(MessageKind::Error, "classpath lookup failed").unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent[0].method(), "window/showMessage");
	assert_eq!(sent[0].params(), &json!({ "type": 1, "message": "classpath lookup failed" }));
	assert_eq!(socket.pending(), 0);
}

#[test]
fn registration_round_trip() {
	let (producer, mut outbox, socket) = producer_with(json!({}));
	producer
		.register_capability("watch", "workspace/didChangeWatchedFiles", Some(watcher_options("**/*.clj")))
		.unwrap();
	producer
		.unregister_capability("watch", "workspace/didChangeWatchedFiles")
		.unwrap();
	let sent = drain(&mut outbox);
	assert_eq!(sent[0].method(), "client/registerCapability");
	assert_eq!(
		sent[0].params(),
		&json!({ "registrations": [{
			"id": "watch",
			"method": "workspace/didChangeWatchedFiles",
			"registerOptions": { "watchers": [{ "globPattern": "**/*.clj" }] },
		}] })
	);
	assert_eq!(sent[1].method(), "client/unregisterCapability");
	assert_eq!(
		sent[1].params(),
		&json!({ "unregisterations": [{ "id": "watch", "method": "workspace/didChangeWatchedFiles" }] })
	);
	// Nobody waits for either answer.
	assert_eq!(socket.pending(), 0);
}
