//! Dataset descriptors: the static declaration of one resource.
//!
//! A descriptor binds a resource key to its endpoint and its ordered column
//! schema. The schema is the only source of truth for which fields a form may
//! edit ([`crate::strip`] drops everything else) and how a cell is interpreted
//! ([`ValueKind`]). Descriptors are immutable once registered in a
//! [`DatasetRegistry`].

mod registry;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub use registry::{DatasetRegistry, RegistryBuilder};

use crate::error::{Error, Result};

/// Field keys owned by the engine that a schema must not declare.
pub(crate) const RESERVED_KEYS: [&str; 2] = ["id", "no"];

/// How a column's values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
	/// Free text.
	#[default]
	Text,
	/// Integer or decimal amount.
	Number,
	/// Calendar date, kept in the server's string format.
	Date,
	/// Workflow state (string label or boolean flag).
	Status,
}

impl ValueKind {
	/// Returns a stable lowercase name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Number => "number",
			Self::Date => "date",
			Self::Status => "status",
		}
	}

	/// Interprets a submitted value under this kind.
	///
	/// Form inputs arrive as strings, so numeric strings are accepted for
	/// [`ValueKind::Number`] and a blank one becomes `null`. Nested arrays and
	/// objects are never valid cell values.
	pub fn normalize(self, value: Value) -> Result<Value, String> {
		match (self, value) {
			(_, Value::Null) => Ok(Value::Null),
			(_, Value::Array(_) | Value::Object(_)) => Err(format!("expected a {} value, got a nested structure", self.as_str())),
			(Self::Text, value) => Ok(value),
			(Self::Number, Value::Number(n)) => Ok(Value::Number(n)),
			(Self::Number, Value::String(s)) => parse_number(&s),
			(Self::Number, other) => Err(format!("expected a number, got {other}")),
			(Self::Date, Value::String(s)) if !s.trim().is_empty() => Ok(Value::String(s)),
			(Self::Date, Value::String(_)) => Ok(Value::Null),
			(Self::Date, other) => Err(format!("expected a date string, got {other}")),
			(Self::Status, value @ (Value::String(_) | Value::Bool(_))) => Ok(value),
			(Self::Status, other) => Err(format!("expected a status label, got {other}")),
		}
	}
}

fn parse_number(raw: &str) -> Result<Value, String> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Ok(Value::Null);
	}
	if let Ok(int) = trimmed.parse::<i64>() {
		return Ok(Value::Number(int.into()));
	}
	trimmed
		.parse::<f64>()
		.ok()
		.and_then(Number::from_f64)
		.map(Value::Number)
		.ok_or_else(|| format!("expected a number, got {raw:?}"))
}

/// One column of a dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
	/// Record field the column reads and writes.
	pub key: String,
	/// Header shown by the renderer.
	pub label: String,
	/// Interpretation of the column's values.
	#[serde(default)]
	pub kind: ValueKind,
	/// Whether a create payload must carry a non-null value.
	#[serde(default = "default_required")]
	pub required: bool,
}

fn default_required() -> bool {
	true
}

impl ColumnDescriptor {
	/// Creates a required column.
	pub fn new(key: impl Into<String>, label: impl Into<String>, kind: ValueKind) -> Self {
		Self {
			key: key.into(),
			label: label.into(),
			kind,
			required: true,
		}
	}

	/// Marks the column optional on create.
	#[must_use]
	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}
}

/// Whether update bodies repeat the record id.
///
/// Some servers reject a redundant `id` in `PUT` bodies, others require it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateIdPolicy {
	/// Send `id` in the body alongside the `endpoint/{id}` path.
	///
	/// The body carries the id in the JSON form the submitted row used, so an
	/// integer id stays an integer. Rows without an `id` send the string form.
	#[default]
	Keep,
	/// Address the record by path only.
	Omit,
}

/// Static declaration of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
	/// Unique, stable resource key (e.g. `"salaries"`).
	pub key: String,
	/// Display title of the table.
	pub title: String,
	/// Collection path relative to the server base URL (e.g. `"/salaries"`).
	pub endpoint: String,
	/// Ordered column schema.
	pub columns: Vec<ColumnDescriptor>,
	/// Id handling for update bodies.
	#[serde(default)]
	pub update_id: UpdateIdPolicy,
}

impl DatasetDescriptor {
	/// Starts a descriptor with no columns.
	pub fn new(key: impl Into<String>, title: impl Into<String>, endpoint: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			title: title.into(),
			endpoint: endpoint.into(),
			columns: Vec::new(),
			update_id: UpdateIdPolicy::default(),
		}
	}

	/// Appends a column.
	#[must_use]
	pub fn column(mut self, column: ColumnDescriptor) -> Self {
		self.columns.push(column);
		self
	}

	/// Appends a required text column.
	#[must_use]
	pub fn text(self, key: &str, label: &str) -> Self {
		self.column(ColumnDescriptor::new(key, label, ValueKind::Text))
	}

	/// Appends a required number column.
	#[must_use]
	pub fn number(self, key: &str, label: &str) -> Self {
		self.column(ColumnDescriptor::new(key, label, ValueKind::Number))
	}

	/// Appends a required date column.
	#[must_use]
	pub fn date(self, key: &str, label: &str) -> Self {
		self.column(ColumnDescriptor::new(key, label, ValueKind::Date))
	}

	/// Appends a required status column.
	#[must_use]
	pub fn status(self, key: &str, label: &str) -> Self {
		self.column(ColumnDescriptor::new(key, label, ValueKind::Status))
	}

	/// Sets the update id policy.
	#[must_use]
	pub fn update_id(mut self, policy: UpdateIdPolicy) -> Self {
		self.update_id = policy;
		self
	}

	/// Looks up a column by key.
	pub fn find_column(&self, key: &str) -> Option<&ColumnDescriptor> {
		self.columns.iter().find(|c| c.key == key)
	}

	/// Checks the structural rules enforced at registration.
	pub fn validate(&self) -> Result<()> {
		let invalid = |reason: String| Error::InvalidDescriptor {
			key: self.key.clone(),
			reason,
		};

		if self.key.trim().is_empty() {
			return Err(invalid("empty resource key".into()));
		}
		if self.endpoint.trim().is_empty() {
			return Err(invalid("empty endpoint path".into()));
		}
		if self.columns.is_empty() {
			return Err(invalid("no columns".into()));
		}

		let mut seen = HashSet::new();
		for column in &self.columns {
			if column.key.is_empty() {
				return Err(invalid("column with empty key".into()));
			}
			if RESERVED_KEYS.contains(&column.key.as_str()) {
				return Err(invalid(format!("column `{}` shadows an engine-owned field", column.key)));
			}
			if !seen.insert(column.key.as_str()) {
				return Err(invalid(format!("duplicate column `{}`", column.key)));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
