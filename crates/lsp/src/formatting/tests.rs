use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Barrier, mpsc};
use std::thread;

use pretty_assertions::assert_eq;

use super::*;
use crate::dispatch::DomainError;
use crate::domain::{DocumentId, RowColRange, Span, WirePosition, WireRange};

fn params() -> RangeFormattingParams {
	RangeFormattingParams {
		text_document: DocumentId {
			uri: "file:///proj/a.clj".into(),
		},
		range: WireRange {
			start: WirePosition { line: 2, character: 0 },
			end: WirePosition { line: 5, character: 9 },
		},
		..Default::default()
	}
}

fn indent_edit() -> Edit {
	Edit {
		span: Span::on_row(3, 1, 3),
		new_text: "  ".into(),
	}
}

#[test]
fn guard_releases_on_drop() {
	let latch = FormattingLatch::new();
	let guard = latch.try_acquire().expect("idle latch");
	assert!(latch.is_busy());
	assert!(latch.try_acquire().is_none());
	drop(guard);
	assert!(!latch.is_busy());
	assert!(latch.try_acquire().is_some());
}

#[test]
fn handler_sees_one_based_inclusive_range() {
	let latch = FormattingLatch::new();
	let mut seen = None;
	let edits = format_range(&latch, params(), |input| {
		seen = Some(input.range);
		Ok(vec![indent_edit()])
	});
	assert_eq!(
		seen,
		Some(RowColRange {
			row: 3,
			col: 1,
			end_row: 6,
			end_col: 10,
		})
	);
	assert_eq!(
		edits,
		json!([{
			"range": { "start": { "line": 2, "character": 0 }, "end": { "line": 2, "character": 2 } },
			"newText": "  ",
		}])
	);
	assert!(!latch.is_busy());
}

#[test]
fn failures_release_the_latch_and_yield_no_edits() {
	let latch = FormattingLatch::new();

	let edits = format_range(&latch, params(), |_| Err(DomainError::new("unbalanced parens").into()));
	assert_eq!(edits, json!([]));
	assert!(!latch.is_busy());

	let edits = format_range(&latch, params(), |_| panic!("zipper fell off the tree"));
	assert_eq!(edits, json!([]));
	assert!(!latch.is_busy());
}

#[test]
fn busy_latch_drops_without_running() {
	let latch = FormattingLatch::new();
	let _held = latch.try_acquire();
	let mut ran = false;
	let edits = format_range(&latch, params(), |_| {
		ran = true;
		Ok(vec![indent_edit()])
	});
	assert_eq!(edits, json!([]));
	assert!(!ran);
}

#[test]
fn concurrent_burst_runs_formatting_once() {
	const CALLERS: usize = 8;

	let latch = Arc::new(FormattingLatch::new());
	let executions = Arc::new(AtomicUsize::new(0));
	assert!(!latch.is_busy());

	let (entered_tx, entered_rx) = mpsc::channel();
	let (release_tx, release_rx) = mpsc::channel::<()>();
	let first = {
		let latch = latch.clone();
		let executions = executions.clone();
		thread::spawn(move || {
			format_range(&latch, params(), |_| {
				executions.fetch_add(1, Ordering::SeqCst);
				entered_tx.send(()).unwrap();
				release_rx.recv().unwrap();
				Ok(vec![indent_edit()])
			})
		})
	};
	entered_rx.recv().unwrap();

	let barrier = Arc::new(Barrier::new(CALLERS - 1));
	let others: Vec<_> = (1..CALLERS)
		.map(|_| {
			let latch = latch.clone();
			let executions = executions.clone();
			let barrier = barrier.clone();
			thread::spawn(move || {
				barrier.wait();
				format_range(&latch, params(), |_| {
					executions.fetch_add(1, Ordering::SeqCst);
					Ok(vec![indent_edit()])
				})
			})
		})
		.collect();
	for other in others {
		assert_eq!(other.join().unwrap(), json!([]));
	}

	release_tx.send(()).unwrap();
	let edits = first.join().unwrap();
	assert_eq!(edits.as_array().map(Vec::len), Some(1));
	assert_eq!(executions.load(Ordering::SeqCst), 1);
	assert!(!latch.is_busy());
}
