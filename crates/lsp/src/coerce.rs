//! Conversion between wire-shaped and domain-shaped values.
//!
//! The boundary is deliberately asymmetric:
//!
//! - Inbound ([`to_domain`]) is permissive. Missing or malformed fields fall back to the
//!   domain type's defaults and the conversion never fails.
//! - Outbound ([`to_wire`], [`to_wire_as`]) is strict. A value that cannot be expressed in
//!   the expected wire shape is logged and replaced by that shape's neutral value, so the
//!   client never receives a malformed payload and one bad value never aborts a call.

use std::fmt;
use std::str::FromStr;

use lsp_types::Uri;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::warn;

/// Expected top-level shape of a wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
	/// Any JSON value.
	Any,
	/// Exactly `null`.
	Null,
	/// A JSON object.
	Object,
	/// `null`, an object or an array.
	Nullable,
	/// A JSON array.
	Sequence,
	/// A `CompletionList` object.
	CompletionList,
}

impl Shape {
	/// Value sent in place of a result that failed validation.
	pub fn neutral(self) -> JsonValue {
		match self {
			Self::Any | Self::Null | Self::Nullable => JsonValue::Null,
			Self::Object => json!({}),
			Self::Sequence => json!([]),
			Self::CompletionList => json!({ "isIncomplete": false, "items": [] }),
		}
	}

	/// Structural check of an already serialized value.
	pub fn accepts(self, value: &JsonValue) -> bool {
		match self {
			Self::Any => true,
			Self::Null => value.is_null(),
			Self::Object => value.is_object(),
			Self::Nullable => value.is_null() || value.is_object() || value.is_array(),
			Self::Sequence => value.is_array(),
			Self::CompletionList => {
				value.get("items").is_some_and(JsonValue::is_array)
					&& value.get("isIncomplete").is_some_and(JsonValue::is_boolean)
			}
		}
	}

	/// Stable label used in log records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Any => "any",
			Self::Null => "null",
			Self::Object => "object",
			Self::Nullable => "nullable",
			Self::Sequence => "sequence",
			Self::CompletionList => "completion-list",
		}
	}
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A domain value that has no valid wire representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ShapeError(String);

impl ShapeError {
	/// Creates a shape error with a human readable reason.
	pub fn new(reason: impl Into<String>) -> Self {
		Self(reason.into())
	}
}

impl From<serde_json::Error> for ShapeError {
	fn from(err: serde_json::Error) -> Self {
		Self(err.to_string())
	}
}

/// Typed conversion of a domain value into its wire counterpart.
pub trait IntoWire: fmt::Debug {
	/// The protocol type this value becomes.
	type Wire: Serialize;

	/// Expected top-level shape of the serialized wire value.
	const SHAPE: Shape;

	/// Converts, rejecting values the protocol cannot express.
	///
	/// # Errors
	///
	/// A [`ShapeError`] naming the first offending part of the value.
	fn to_wire(&self) -> Result<Self::Wire, ShapeError>;
}

impl<T: IntoWire> IntoWire for Vec<T> {
	type Wire = Vec<T::Wire>;
	const SHAPE: Shape = Shape::Sequence;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		self.iter().map(IntoWire::to_wire).collect()
	}
}

impl<T: IntoWire> IntoWire for Option<T> {
	type Wire = Option<T::Wire>;
	const SHAPE: Shape = Shape::Nullable;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		self.as_ref().map(IntoWire::to_wire).transpose()
	}
}

impl IntoWire for JsonValue {
	type Wire = JsonValue;
	const SHAPE: Shape = Shape::Any;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(self.clone())
	}
}

impl IntoWire for () {
	type Wire = ();
	const SHAPE: Shape = Shape::Null;

	fn to_wire(&self) -> Result<Self::Wire, ShapeError> {
		Ok(())
	}
}

/// Converts wire params into a domain value, never failing.
///
/// `null` (absent params) yields `T::default()` silently; anything that does not
/// deserialize is logged and also yields `T::default()`.
pub fn to_domain<T>(method: &str, params: JsonValue) -> T
where
	T: DeserializeOwned + Default,
{
	if params.is_null() {
		return T::default();
	}
	match serde_json::from_value(params) {
		Ok(value) => value,
		Err(err) => {
			warn!(
				target: "lsp.coerce",
				method,
				domain = std::any::type_name::<T>(),
				error = %err,
				"params did not coerce, using defaults"
			);
			T::default()
		}
	}
}

/// Field-level counterpart of [`to_domain`] for `#[serde(deserialize_with)]`.
///
/// A mistyped field is logged and replaced by its default while its siblings keep their
/// values. `null` yields the default silently.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	let value = JsonValue::deserialize(deserializer)?;
	if value.is_null() {
		return Ok(T::default());
	}
	Ok(serde_json::from_value(value).unwrap_or_else(|err| {
		warn!(
			target: "lsp.coerce",
			field = std::any::type_name::<T>(),
			error = %err,
			"field did not coerce, using defaults"
		);
		T::default()
	}))
}

/// Converts a domain value into the wire shape declared by its type.
pub fn to_wire<D: IntoWire>(method: &str, value: &D) -> JsonValue {
	to_wire_as(method, value, D::SHAPE)
}

/// Converts a domain value and validates it against `shape`.
///
/// Never fails: a violation is logged with the method, the shape and the offending value,
/// and `shape.neutral()` is returned instead.
pub fn to_wire_as<D: IntoWire>(method: &str, value: &D, shape: Shape) -> JsonValue {
	match try_to_wire(value, shape) {
		Ok(json) => json,
		Err(err) => {
			warn!(
				target: "lsp.coerce",
				method,
				%shape,
				value = ?value,
				error = %err,
				"result has no valid wire representation, sending neutral value"
			);
			shape.neutral()
		}
	}
}

/// Converts a domain value and validates it against `shape`, without a fallback.
///
/// # Errors
///
/// A [`ShapeError`] when the value has no wire form or its wire form is not `shape`.
pub fn try_to_wire<D: IntoWire>(value: &D, shape: Shape) -> Result<JsonValue, ShapeError> {
	let json = serde_json::to_value(value.to_wire()?)?;
	if !shape.accepts(&json) {
		return Err(ShapeError::new(format!("expected {shape}, got {json}")));
	}
	Ok(json)
}

/// Parses a document URI for outbound use.
///
/// # Errors
///
/// A [`ShapeError`] when `uri` is not a valid URI.
pub fn wire_uri(uri: &str) -> Result<Uri, ShapeError> {
	Uri::from_str(uri).map_err(|err| ShapeError::new(format!("invalid uri {uri:?}: {err}")))
}
