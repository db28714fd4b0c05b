/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Request handlers whose result a client is actively waiting on.
	Interactive,
	/// Fire-and-forget work acknowledged before it completes.
	Background,
	/// Recurring maintenance loops such as liveness checks.
	Periodic,
}

impl TaskClass {
	/// Stable label used in log records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Periodic => "periodic",
		}
	}
}

impl std::fmt::Display for TaskClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
