//! Wire-level message envelopes exchanged with the transport.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A request ID, either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// Numeric ID.
	Number(i32),
	/// String ID.
	String(String),
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(n) => write!(f, "{n}"),
			Self::String(s) => f.write_str(s),
		}
	}
}

impl From<i32> for RequestId {
	fn from(id: i32) -> Self {
		Self::Number(id)
	}
}

/// An inbound or outbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyRequest {
	/// The request id.
	pub id: RequestId,
	/// The method to be invoked.
	pub method: String,
	/// The method's params.
	#[serde(default)]
	#[serde(skip_serializing_if = "serde_json::Value::is_null")]
	pub params: JsonValue,
}

/// A notification, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyNotification {
	/// The method to be invoked.
	pub method: String,
	/// The notification's params.
	#[serde(default)]
	#[serde(skip_serializing_if = "serde_json::Value::is_null")]
	pub params: JsonValue,
}

/// A response correlated to a request by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyResponse {
	/// The id of the request this responds to.
	pub id: RequestId,
	/// The result, present on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<JsonValue>,
	/// The error, present on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

/// A JSON-RPC error code.
///
/// Codes defined and/or used by LSP are associated constants, eg. [`ErrorCode::REQUEST_FAILED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
	/// Invalid JSON was received by the server.
	pub const PARSE_ERROR: Self = Self(-32700);
	/// The JSON sent is not a valid Request object.
	pub const INVALID_REQUEST: Self = Self(-32600);
	/// The method does not exist / is not available.
	pub const METHOD_NOT_FOUND: Self = Self(-32601);
	/// Invalid method parameter(s).
	pub const INVALID_PARAMS: Self = Self(-32602);
	/// Internal JSON-RPC error.
	pub const INTERNAL_ERROR: Self = Self(-32603);
	/// A request arrived before `initialize`.
	pub const SERVER_NOT_INITIALIZED: Self = Self(-32002);
	/// (Defined by LSP specification without description)
	pub const UNKNOWN_ERROR_CODE: Self = Self(-32001);
	/// A request failed but was syntactically correct.
	pub const REQUEST_FAILED: Self = Self(-32803);
	/// The server cancelled the request.
	pub const SERVER_CANCELLED: Self = Self(-32802);
	/// The document was modified outside normal conditions.
	pub const CONTENT_MODIFIED: Self = Self(-32801);
	/// The client cancelled the request.
	pub const REQUEST_CANCELLED: Self = Self(-32800);
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// The error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({code})")]
pub struct ResponseError {
	/// A number indicating the error type that occurred.
	pub code: ErrorCode,
	/// A short description of the error.
	pub message: String,
	/// Additional information about the error.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// Creates an error without attached data.
	#[must_use]
	pub fn new(code: ErrorCode, message: impl fmt::Display) -> Self {
		Self {
			code,
			message: message.to_string(),
			data: None,
		}
	}
}
