//! Single-flight guard around range formatting.
//!
//! Range formatting mutates shared analysis state, so two overlapping runs are unsafe. A
//! second request arriving while one runs is dropped and answered with an empty edit set;
//! editors re-request on their own.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value as JsonValue, json};
use tracing::{debug, error};

use crate::coerce::to_wire;
use crate::dispatch::{HandlerResult, panic_message};
use crate::domain::{Edit, RangeFormatting, RangeFormattingParams};

const METHOD: &str = "textDocument/rangeFormatting";

/// A latch that is either idle or held by exactly one formatting run.
#[derive(Debug, Default)]
pub struct FormattingLatch {
	busy: AtomicBool,
}

impl FormattingLatch {
	/// An idle latch.
	pub const fn new() -> Self {
		Self {
			busy: AtomicBool::new(false),
		}
	}

	/// Moves the latch from idle to busy, or returns `None` when it already is busy.
	///
	/// The latch returns to idle when the guard drops, including during unwinding.
	pub fn try_acquire(&self) -> Option<LatchGuard<'_>> {
		self.busy
			.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
			.ok()
			.map(|_| LatchGuard { busy: &self.busy })
	}

	/// Returns `true` while a run holds the latch.
	pub fn is_busy(&self) -> bool {
		self.busy.load(Ordering::Acquire)
	}
}

/// Proof of holding a [`FormattingLatch`].
#[derive(Debug)]
#[must_use = "the latch is released as soon as the guard drops"]
pub struct LatchGuard<'a> {
	busy: &'a AtomicBool,
}

impl Drop for LatchGuard<'_> {
	fn drop(&mut self) {
		self.busy.store(false, Ordering::Release);
	}
}

/// Runs `format` under `latch` and returns the wire edit list.
///
/// Never fails and never waits: a held latch, a handler error and a handler panic all
/// yield `[]`. The latch is idle again before this returns.
pub fn format_range<F>(latch: &FormattingLatch, params: RangeFormattingParams, format: F) -> JsonValue
where
	F: FnOnce(RangeFormatting) -> HandlerResult<Vec<Edit>>,
{
	let uri = params.text_document.uri.clone();
	let Some(_guard) = latch.try_acquire() else {
		debug!(target: "lsp.formatting", %uri, "range formatting already running, dropping request");
		return json!([]);
	};

	let input = RangeFormatting {
		text_document: params.text_document,
		range: params.range.into(),
		options: params.options,
	};
	match catch_unwind(AssertUnwindSafe(|| format(input))) {
		Ok(Ok(edits)) => to_wire(METHOD, &edits),
		Ok(Err(err)) => {
			error!(target: "lsp.formatting", %uri, error = %err, "range formatting failed");
			json!([])
		}
		Err(payload) => {
			error!(
				target: "lsp.formatting",
				%uri,
				panic = %panic_message(payload.as_ref()),
				"range formatting panicked"
			);
			json!([])
		}
	}
}

#[cfg(test)]
mod tests;
