use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};

use super::*;

/// Counts `debug` records on the dispatch target.
struct CallRecords(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for CallRecords {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
		let meta = event.metadata();
		if meta.target() == "lsp.dispatch" && *meta.level() == Level::DEBUG {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}
}

fn count_call_records(f: impl FnOnce()) -> usize {
	let count = Arc::new(AtomicUsize::new(0));
	let subscriber = tracing_subscriber::registry().with(CallRecords(count.clone()));
	tracing::subscriber::with_default(subscriber, f);
	count.load(Ordering::SeqCst)
}

fn ready(fut: ResponseFuture) -> Outcome {
	fut.now_or_never().expect("sync dispatch resolves immediately")
}

fn count_items(value: &JsonValue) -> String {
	value.as_array().map_or(0, Vec::len).to_string()
}

#[test]
fn sync_success_is_resolved_at_once() {
	let call = Call::request("textDocument/documentSymbol", JsonValue::Null);
	let outcome = ready(run(call, Mode::Sync, Some(count_items), || Ok(json!([1, 2]))));
	assert_eq!(outcome, Ok(Some(json!([1, 2]))));
}

#[test]
fn domain_error_becomes_protocol_error() {
	let call = Call::request("textDocument/rename", JsonValue::Null);
	let outcome = ready(run(call, Mode::Sync, None, || {
		Err(DomainError::new("cannot rename a keyword").with_data(json!({ "kind": "keyword" })).into())
	}));
	let err = outcome.unwrap_err();
	assert_eq!(err.code, ErrorCode::REQUEST_FAILED);
	assert_eq!(err.message, "cannot rename a keyword");
	assert_eq!(err.data, Some(json!({ "kind": "keyword" })));
}

#[test]
fn fault_is_silent() {
	let call = Call::request("textDocument/hover", JsonValue::Null);
	let outcome = ready(run(call, Mode::Sync, None, || Err(anyhow::anyhow!("analysis cache poisoned").into())));
	assert_eq!(outcome, Ok(None));
}

#[test]
fn panic_is_a_fault() {
	let call = Call::request("textDocument/hover", JsonValue::Null);
	let outcome = ready(run(call, Mode::Sync, None, || panic!("index out of bounds")));
	assert_eq!(outcome, Ok(None));
}

#[test]
fn exactly_one_record_per_call() {
	let records = count_call_records(|| {
		let _ = ready(run(Call::request("a", JsonValue::Null), Mode::Sync, Some(count_items), || {
			Ok(json!([]))
		}));
		let _ = ready(run(Call::request("b", JsonValue::Null), Mode::Sync, None, || {
			Err(DomainError::new("no").into())
		}));
		let _ = ready(run(Call::notification("c", JsonValue::Null), Mode::Sync, None, || {
			panic!("boom")
		}));
	});
	assert_eq!(records, 3);
}

#[test]
fn panicking_summary_still_logs_and_answers() {
	fn explode(_: &JsonValue) -> String {
		panic!("summary bug")
	}

	let mut outcome = None;
	let records = count_call_records(|| {
		let call = Call::request("textDocument/references", JsonValue::Null);
		outcome = Some(ready(run(call, Mode::Sync, Some(explode), || Ok(json!([])))));
	});
	assert_eq!(records, 1);
	assert_eq!(outcome, Some(Ok(Some(json!([])))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_runs_off_the_calling_thread() {
	let caller = std::thread::current().id();
	let call = Call::request("textDocument/completion", JsonValue::Null);
	let outcome = run(call, Mode::Async, None, move || {
		Ok(json!(std::thread::current().id() != caller))
	})
	.await;
	assert_eq!(outcome, Ok(Some(json!(true))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detached_request_is_acknowledged_before_it_runs() {
	let (started_tx, started_rx) = std::sync::mpsc::channel();
	let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
	let call = Call::request("workspace/executeCommand", JsonValue::Null);
	let outcome = run(call, Mode::Detached, None, move || {
		started_tx.send(()).ok();
		release_rx.recv().ok();
		Ok(json!("done"))
	})
	.await;
	assert_eq!(outcome, Ok(Some(JsonValue::Null)));

	tokio::task::spawn_blocking(move || started_rx.recv_timeout(Duration::from_secs(5)))
		.await
		.unwrap()
		.expect("detached body runs");
	release_tx.send(()).unwrap();
}

#[test]
fn detached_notification_yields_nothing() {
	let call = Call::notification("textDocument/didSave", JsonValue::Null);
	let outcome = ready(run(call, Mode::Detached, None, || Ok(JsonValue::Null)));
	assert_eq!(outcome, Ok(None));
}

#[test]
fn method_not_found_code() {
	let err: ResponseError = DomainError::method_not_found("textDocument/linkedEditingRange").into();
	assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
}
