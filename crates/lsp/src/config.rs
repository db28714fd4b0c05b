//! Server configuration.

use std::time::Duration;

/// Glob for the source files the server watches after `initialized`.
pub const DEFAULT_WATCH_GLOB: &str = "**/*.{clj,cljs,cljc,cljd,edn,bb,clj_kondo}";

/// Static configuration of a [`crate::Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
	/// Name reported in `serverInfo`.
	pub name: String,
	/// Version reported in `serverInfo`.
	pub version: Option<String>,
	/// How often the parent process liveness probe runs.
	pub probe_interval: Duration,
	/// Progress token used when a caller supplies none.
	pub progress_token: String,
	/// Glob registered for watched-file notifications.
	pub watch_glob: String,
	/// Characters that trigger completion.
	pub completion_triggers: Vec<String>,
	/// Characters that trigger signature help.
	pub signature_triggers: Vec<String>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			name: "tessel".into(),
			version: Some(env!("CARGO_PKG_VERSION").into()),
			probe_interval: Duration::from_secs(5),
			progress_token: "tessel/progress".into(),
			watch_glob: DEFAULT_WATCH_GLOB.into(),
			completion_triggers: vec![":".into(), "/".into()],
			signature_triggers: vec![" ".into()],
		}
	}
}

impl ServerConfig {
	/// Create a configuration reporting `name` to the client.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Set the reported version.
	pub fn version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	/// Set the liveness probe interval.
	pub fn probe_interval(mut self, interval: Duration) -> Self {
		self.probe_interval = interval;
		self
	}

	/// Set the fallback progress token.
	pub fn progress_token(mut self, token: impl Into<String>) -> Self {
		self.progress_token = token.into();
		self
	}

	/// Set the watched-file glob.
	pub fn watch_glob(mut self, glob: impl Into<String>) -> Self {
		self.watch_glob = glob.into();
		self
	}

	/// Set completion trigger characters.
	pub fn completion_triggers(mut self, triggers: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.completion_triggers = triggers.into_iter().map(Into::into).collect();
		self
	}

	/// Set signature help trigger characters.
	pub fn signature_triggers(mut self, triggers: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.signature_triggers = triggers.into_iter().map(Into::into).collect();
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = ServerConfig::default();
		assert_eq!(config.name, "tessel");
		assert_eq!(config.probe_interval, Duration::from_secs(5));
		assert_eq!(config.watch_glob, DEFAULT_WATCH_GLOB);
	}

	#[test]
	fn test_server_config_builder() {
		let config = ServerConfig::new("clojure-tools")
			.version("2.0.1")
			.probe_interval(Duration::from_millis(50))
			.progress_token("clojure-tools/startup")
			.completion_triggers([":"]);

		assert_eq!(config.name, "clojure-tools");
		assert_eq!(config.version.as_deref(), Some("2.0.1"));
		assert_eq!(config.probe_interval, Duration::from_millis(50));
		assert_eq!(config.progress_token, "clojure-tools/startup");
		assert_eq!(config.completion_triggers, vec![":"]);
		assert_eq!(config.signature_triggers, vec![" "]);
	}
}
