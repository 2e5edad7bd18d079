//! Engine configuration file.
//!
//! ```toml
//! base_url = "http://localhost:3000"
//! timeout_secs = 30
//!
//! # Optional. When present, replaces the builtin catalog.
//! [[datasets]]
//! key = "salaries"
//! title = "Salaries"
//! endpoint = "/salaries"
//! columns = [
//!     { key = "name", label = "Name" },
//!     { key = "amount", label = "Amount", kind = "number" },
//!     { key = "date", label = "Date", kind = "date" },
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog;
use crate::dataset::{DatasetDescriptor, DatasetRegistry};
use crate::error::{self, TransportError};

/// Server used when the config names none.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Per-request timeout used when the config names none.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// The configured datasets do not form a valid registry.
	#[error("invalid datasets: {0}")]
	Registry(#[from] error::Error),

	/// The transport could not be built from the configured values.
	#[error("invalid transport settings: {0}")]
	Transport(#[from] TransportError),
}

/// Settings for an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// Server base URL; endpoint paths resolve below it.
	pub base_url: String,
	/// Per-request timeout in seconds.
	pub timeout_secs: u64,
	/// Dataset descriptors. Empty means the builtin catalog.
	pub datasets: Vec<DatasetDescriptor>,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			datasets: Vec::new(),
		}
	}
}

impl EngineConfig {
	/// Parses a config document.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Reads and parses a config file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::parse(&input)?;
		debug!(path = %path.display(), datasets = config.datasets.len(), "config.loaded");
		Ok(config)
	}

	/// Builds the registry for this config.
	pub fn registry(&self) -> Result<DatasetRegistry, ConfigError> {
		let registry = if self.datasets.is_empty() {
			catalog::builtin_registry()?
		} else {
			DatasetRegistry::from_descriptors(self.datasets.iter().cloned())?
		};
		Ok(registry)
	}

	/// Returns the per-request timeout.
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::dataset::{UpdateIdPolicy, ValueKind};
	use crate::error::Error;

	#[test]
	fn empty_document_uses_defaults() {
		let config = EngineConfig::parse("").unwrap();
		assert_eq!(config, EngineConfig::default());
		assert_eq!(config.timeout(), Duration::from_secs(30));
		assert_eq!(config.registry().unwrap().len(), catalog::builtin().len());
	}

	#[test]
	fn datasets_replace_builtin_catalog() {
		let config = EngineConfig::parse(
			r#"
			base_url = "https://payroll.example.com/api"
			timeout_secs = 5

			[[datasets]]
			key = "salaries"
			title = "Salaries"
			endpoint = "/salaries"
			update_id = "omit"
			columns = [
				{ key = "name", label = "Name" },
				{ key = "amount", label = "Amount", kind = "number" },
				{ key = "note", label = "Note", required = false },
			]
			"#,
		)
		.unwrap();

		assert_eq!(config.base_url, "https://payroll.example.com/api");
		let registry = config.registry().unwrap();
		assert_eq!(registry.len(), 1);
		let salaries = registry.lookup("salaries").unwrap();
		assert_eq!(salaries.update_id, UpdateIdPolicy::Omit);
		assert_eq!(salaries.columns[0].kind, ValueKind::Text);
		assert!(salaries.columns[1].required);
		assert!(!salaries.columns[2].required);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(matches!(EngineConfig::parse("base_uri = \"x\""), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn duplicate_datasets_fail_registry() {
		let config = EngineConfig::parse(
			r#"
			[[datasets]]
			key = "a"
			title = "A"
			endpoint = "/a"
			columns = [{ key = "x", label = "X" }]

			[[datasets]]
			key = "a"
			title = "A again"
			endpoint = "/a2"
			columns = [{ key = "x", label = "X" }]
			"#,
		)
		.unwrap();
		assert!(matches!(
			config.registry(),
			Err(ConfigError::Registry(Error::DuplicateResource { key })) if key == "a"
		));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "timeout_secs = 12").unwrap();
		let config = EngineConfig::load(file.path()).unwrap();
		assert_eq!(config.timeout_secs, 12);
		assert_eq!(config.base_url, DEFAULT_BASE_URL);
	}

	#[test]
	fn missing_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.toml");
		match EngineConfig::load(&path) {
			Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
			other => panic!("expected io error, got {other:?}"),
		}
	}
}
