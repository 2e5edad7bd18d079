//! Row projection: derived display fields in, clean write payloads out.
//!
//! [`project`] decorates records with `no`, their 1-based position in the
//! current list order. The value is recomputed on every call and never
//! persisted. [`strip`] is the inverse boundary: whatever the renderer
//! submits is reduced to the dataset schema before it reaches a transport.
//!
//! # Invariants
//!
//! * For N records, `project` emits `no` values exactly `1..=N`, in input order.
//! * `strip` output never contains `no` or a key outside the schema.
//! * Create payloads never contain `id`; update payloads carry the target id
//!   only when the descriptor's [`UpdateIdPolicy`] is `Keep`.

use serde::Deserialize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::dataset::{DatasetDescriptor, UpdateIdPolicy};
use crate::error::{Error, Result};
use crate::record::{Fields, Payload, Record, RecordId, Row};

/// Display-only field holding the row's list position.
pub const SEQUENCE_FIELD: &str = "no";

/// A record decorated with its display position.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
	/// 1-based position in the list the row was projected from.
	pub no: usize,
	/// The underlying record.
	pub record: Record,
}

impl ProjectedRow {
	/// Returns the record id.
	pub fn id(&self) -> &RecordId {
		&self.record.id
	}

	/// Returns a stored field.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.record.get(key)
	}

	/// Flattens the row into the editable map handed to forms.
	pub fn to_row(&self) -> Row {
		let mut row = Fields::new();
		row.insert("id".into(), Value::String(self.record.id.to_string()));
		row.insert(SEQUENCE_FIELD.into(), Value::from(self.no));
		row.extend(self.record.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
		row
	}
}

impl Serialize for ProjectedRow {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.record.fields.len() + 2))?;
		map.serialize_entry("id", &self.record.id)?;
		map.serialize_entry(SEQUENCE_FIELD, &self.no)?;
		for (key, value) in &self.record.fields {
			map.serialize_entry(key, value)?;
		}
		map.end()
	}
}

/// Decorates records with their 1-based list position.
pub fn project(records: &[Record]) -> Vec<ProjectedRow> {
	records
		.iter()
		.enumerate()
		.map(|(index, record)| ProjectedRow {
			no: index + 1,
			record: record.clone(),
		})
		.collect()
}

/// Which write a payload is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripMode<'a> {
	/// `POST`: the server assigns the id, required columns must be present.
	Create,
	/// `PUT endpoint/{id}` for the given record.
	Update(&'a RecordId),
}

/// Reduces a submitted row to a write payload for `descriptor`.
///
/// Drops `no` and every key outside the schema, and normalizes values by
/// their column's [`crate::ValueKind`].
///
/// # Errors
///
/// [`Error::InvalidPayload`] when a required column is absent (or null) on
/// create, a value cannot be read under its column's kind, or an update row
/// names a different id than the one addressed.
pub fn strip(descriptor: &DatasetDescriptor, row: &Row, mode: StripMode<'_>) -> Result<Payload> {
	let invalid = |reason: String| Error::InvalidPayload {
		key: descriptor.key.clone(),
		reason,
	};

	let mut fields = Fields::new();
	let mut missing = Vec::new();

	for column in &descriptor.columns {
		let value = match row.get(&column.key) {
			Some(raw) => column
				.kind
				.normalize(raw.clone())
				.map_err(|reason| invalid(format!("column `{}`: {reason}", column.key)))?,
			None => Value::Null,
		};

		if value.is_null() {
			if matches!(mode, StripMode::Create) && column.required {
				missing.push(column.key.as_str());
				continue;
			}
			if !row.contains_key(&column.key) {
				continue;
			}
		}
		fields.insert(column.key.clone(), value);
	}

	if !missing.is_empty() {
		return Err(invalid(format!("missing required columns: {}", missing.join(", "))));
	}

	if let StripMode::Update(id) = mode {
		let mut body_id = Value::String(id.to_string());
		if let Some(raw) = row.get("id") {
			let submitted = RecordId::deserialize(raw.clone()).map_err(|_| invalid(format!("unusable row id {raw}")))?;
			if &submitted != id {
				return Err(invalid(format!("row id `{submitted}` does not match addressed record `{id}`")));
			}
			// Echo the row's own JSON form so integer ids stay integers.
			body_id = raw.clone();
		}
		if descriptor.update_id == UpdateIdPolicy::Keep {
			fields.insert("id".into(), body_id);
		}
	}

	let dropped = row.keys().filter(|k| !fields.contains_key(k.as_str()) && descriptor.find_column(k).is_none()).count();
	trace!(resource = %descriptor.key, kept = fields.len(), dropped, "projector.strip");

	Ok(Payload::from_fields(fields))
}
