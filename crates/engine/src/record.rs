//! Records as exchanged with the REST collaborator.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Field map of a record, keyed by column key.
pub type Fields = serde_json::Map<String, Value>;

/// A row as held by the rendering layer.
///
/// May contain the derived `no`, the record `id`, and arbitrary form state;
/// [`crate::strip`] reduces it to a [`Payload`].
pub type Row = Fields;

/// Server-assigned, opaque record identifier.
///
/// Servers that emit integer ids are accepted; the id is kept as its decimal
/// string so that it round-trips unchanged into `endpoint/{id}` paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
	/// Wraps an id string.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RecordId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RecordId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for RecordId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl<'de> Deserialize<'de> for RecordId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum RawId {
			Text(String),
			Signed(i64),
			Unsigned(u64),
		}

		Ok(match RawId::deserialize(deserializer)? {
			RawId::Text(id) => Self(id),
			RawId::Signed(id) => Self(id.to_string()),
			RawId::Unsigned(id) => Self(id.to_string()),
		})
	}
}

/// A persisted record: a server-assigned id plus the stored fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
	/// Server-assigned identifier, stable for the record's lifetime.
	pub id: RecordId,
	/// Stored fields, never containing `id` or the derived `no`.
	#[serde(flatten)]
	pub fields: Fields,
}

impl Record {
	/// Creates a record from an id and its fields.
	///
	/// `id` and `no` entries in `fields` are dropped.
	pub fn new(id: impl Into<RecordId>, mut fields: Fields) -> Self {
		fields.remove("id");
		fields.remove("no");
		Self { id: id.into(), fields }
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	/// Decodes one element of a server response.
	///
	/// A non-object or an object without a usable `id` violates the REST
	/// contract. A stray `no` is dropped since it is never persisted state.
	pub fn from_value(value: Value) -> Result<Self, TransportError> {
		let Value::Object(mut fields) = value else {
			return Err(TransportError::Contract(format!("expected a record object, got {value}")));
		};
		let raw_id = fields
			.remove("id")
			.ok_or_else(|| TransportError::Contract("record without `id`".into()))?;
		let id = RecordId::deserialize(raw_id).map_err(|e| TransportError::Contract(format!("unusable record `id`: {e}")))?;
		if id.as_str().is_empty() {
			return Err(TransportError::Contract("record with empty `id`".into()));
		}
		fields.remove("no");
		Ok(Self { id, fields })
	}

	/// Decodes a JSON array response into records, in server order.
	pub fn list_from_value(value: Value) -> Result<Vec<Self>, TransportError> {
		let Value::Array(items) = value else {
			return Err(TransportError::Contract("list response is not a JSON array".into()));
		};
		items
			.into_iter()
			.enumerate()
			.map(|(index, item)| Self::from_value(item).map_err(|e| TransportError::Contract(format!("element {index}: {e}"))))
			.collect()
	}
}

/// A write body produced by [`crate::strip`].
///
/// Only the projector constructs payloads, so a transport never sees the
/// derived `no` or fields outside the dataset schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Payload(Fields);

impl Payload {
	pub(crate) fn from_fields(fields: Fields) -> Self {
		Self(fields)
	}

	/// Returns the payload fields.
	pub fn fields(&self) -> &Fields {
		&self.0
	}

	/// Consumes the payload into its fields.
	pub fn into_fields(self) -> Fields {
		self.0
	}

	/// Returns the value under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns true if the payload carries `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}
}
