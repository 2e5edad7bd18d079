//! Renderer-facing boundary for one dataset.
//!
//! A [`TableController`] binds a descriptor to the shared cache and executor.
//! Reads return projected rows; writes return an [`Outcome`] carrying a
//! [`Notice`] the renderer can show as-is. No engine error crosses this
//! boundary.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore, FetchStatus};
use crate::dataset::{ColumnDescriptor, DatasetDescriptor};
use crate::error::{Error, Result};
use crate::mutation::MutationExecutor;
use crate::projector::{ProjectedRow, project};
use crate::record::{Record, RecordId, Row};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
	/// Informational message (default).
	#[default]
	Info,
	/// The requested change was applied.
	Success,
	/// Nothing was applied, but nothing is broken either.
	Warn,
	/// The request failed and may be retried.
	Error,
}

impl Level {
	/// Returns a stable lowercase name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Info => "info",
			Self::Success => "success",
			Self::Warn => "warn",
			Self::Error => "error",
		}
	}
}

/// User-facing message attached to an outcome or a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	/// Severity.
	pub level: Level,
	/// Human-readable text.
	pub message: String,
}

impl Notice {
	fn new(level: Level, message: impl Into<String>) -> Self {
		Self {
			level,
			message: message.into(),
		}
	}
}

impl fmt::Display for Notice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] {}", self.level.as_str(), self.message)
	}
}

/// What a submitted intent resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// A record was created.
	Created,
	/// A record was updated.
	Updated,
	/// A record was removed.
	Removed,
	/// The row was rejected before any request; form state should be kept.
	InvalidPayload,
	/// The addressed record was already gone; the list has been refreshed.
	RecordNotFound,
	/// The server or network failed; the request can be retried.
	MutationFailed,
}

/// Result of a `submit_*` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
	/// Classification.
	pub kind: OutcomeKind,
	/// Message for the renderer.
	pub notice: Notice,
	/// The record returned by the server, for creates and updates.
	pub record: Option<Record>,
	/// The underlying error, for failed outcomes.
	pub error: Option<Error>,
}

impl Outcome {
	/// Returns true if the change was applied.
	pub fn is_success(&self) -> bool {
		matches!(self.kind, OutcomeKind::Created | OutcomeKind::Updated | OutcomeKind::Removed)
	}

	/// Returns true if resubmitting the same intent may succeed.
	pub fn is_retryable(&self) -> bool {
		self.error.as_ref().is_some_and(Error::is_retryable)
	}

	fn applied(kind: OutcomeKind, message: String, record: Option<Record>) -> Self {
		Self {
			kind,
			notice: Notice::new(Level::Success, message),
			record,
			error: None,
		}
	}

	fn failed(title: &str, error: Error) -> Self {
		let (kind, notice) = match &error {
			Error::InvalidPayload { reason, .. } => (OutcomeKind::InvalidPayload, Notice::new(Level::Warn, format!("{title}: {reason}"))),
			Error::RecordNotFound { id, .. } => (
				OutcomeKind::RecordNotFound,
				Notice::new(Level::Warn, format!("{title}: record {id} no longer exists, the list was refreshed")),
			),
			Error::MutationFailed { operation, cause, .. } => (
				OutcomeKind::MutationFailed,
				Notice::new(Level::Error, format!("{title}: {operation} failed: {cause}")),
			),
			other => (OutcomeKind::MutationFailed, Notice::new(Level::Error, format!("{title}: {other}"))),
		};
		Self {
			kind,
			notice,
			record: None,
			error: Some(error),
		}
	}
}

/// Everything a renderer needs to draw one table.
#[derive(Debug, Clone)]
pub struct TableView {
	/// Table heading.
	pub title: String,
	/// Ordered column schema.
	pub columns: Vec<ColumnDescriptor>,
	/// Projected rows.
	pub rows: Vec<ProjectedRow>,
	/// Fetch status behind the rows.
	pub status: FetchStatus,
	/// A refetch is in flight behind these rows.
	pub revalidating: bool,
	/// Set when the last fetch failed.
	pub notice: Option<Notice>,
}

/// Controller for one dataset's table.
#[derive(Clone)]
pub struct TableController {
	descriptor: Arc<DatasetDescriptor>,
	cache: CacheStore,
	executor: MutationExecutor,
}

impl TableController {
	/// Binds the table for `key`.
	///
	/// # Errors
	///
	/// [`Error::UnknownResource`] if `key` is not registered with the cache's registry.
	pub fn new(key: &str, cache: CacheStore, executor: MutationExecutor) -> Result<Self> {
		let descriptor = cache.registry().lookup(key)?;
		Ok(Self {
			descriptor,
			cache,
			executor,
		})
	}

	/// Returns the bound descriptor.
	pub fn descriptor(&self) -> &DatasetDescriptor {
		&self.descriptor
	}

	/// Returns the resource key.
	pub fn key(&self) -> &str {
		&self.descriptor.key
	}

	/// Returns the column schema.
	pub fn columns(&self) -> &[ColumnDescriptor] {
		&self.descriptor.columns
	}

	/// Returns the projected rows once the latest fetch has resolved.
	///
	/// If that fetch failed, the last good rows are returned (possibly none).
	pub async fn current_rows(&self) -> Vec<ProjectedRow> {
		match self.cache.settled(self.key()).await {
			Ok(entry) => project(&entry.records),
			Err(e) => {
				warn!(resource = %self.key(), error = %e, "table.rows.unavailable");
				Vec::new()
			}
		}
	}

	/// Returns the rows currently cached without waiting, starting the first
	/// fetch if needed.
	pub fn rows_now(&self) -> Vec<ProjectedRow> {
		self.cache.get(self.key()).map(|entry| project(&entry.records)).unwrap_or_default()
	}

	/// Returns the settled view of the table.
	pub async fn view(&self) -> TableView {
		match self.cache.settled(self.key()).await {
			Ok(entry) => self.view_of(&entry),
			Err(e) => {
				warn!(resource = %self.key(), error = %e, "table.view.unavailable");
				TableView {
					title: self.descriptor.title.clone(),
					columns: self.descriptor.columns.clone(),
					rows: Vec::new(),
					status: FetchStatus::Error,
					revalidating: false,
					notice: Some(Notice::new(Level::Error, e.to_string())),
				}
			}
		}
	}

	fn view_of(&self, entry: &CacheEntry) -> TableView {
		let notice = match (&entry.status, &entry.last_error) {
			(FetchStatus::Error, Some(Error::FetchFailed { cause, .. })) => Some(Notice::new(
				Level::Error,
				format!("could not load {}: {cause}", self.descriptor.title),
			)),
			(FetchStatus::Error, Some(other)) => Some(Notice::new(Level::Error, other.to_string())),
			_ => None,
		};
		TableView {
			title: self.descriptor.title.clone(),
			columns: self.descriptor.columns.clone(),
			rows: project(&entry.records),
			status: entry.status,
			revalidating: entry.revalidating,
			notice,
		}
	}

	/// Re-issues the list fetch, e.g. after a failed load.
	pub fn refresh(&self) {
		debug!(resource = %self.key(), "table.refresh");
		if let Err(e) = self.cache.invalidate(self.key()) {
			warn!(resource = %self.key(), error = %e, "table.refresh.failed");
		}
	}

	/// Subscribes to the table's cache snapshots.
	pub fn subscribe(&self) -> Result<watch::Receiver<CacheEntry>> {
		self.cache.subscribe(self.key())
	}

	/// Submits a new row.
	pub async fn submit_add(&self, row: &Row) -> Outcome {
		match self.executor.create(self.key(), row).await {
			Ok(record) => Outcome::applied(
				OutcomeKind::Created,
				format!("{}: record {} added", self.descriptor.title, record.id),
				Some(record),
			),
			Err(e) => Outcome::failed(&self.descriptor.title, e),
		}
	}

	/// Submits an edited row for record `id`.
	pub async fn submit_edit(&self, id: &RecordId, row: &Row) -> Outcome {
		match self.executor.update(self.key(), id, row).await {
			Ok(record) => Outcome::applied(
				OutcomeKind::Updated,
				format!("{}: record {id} updated", self.descriptor.title),
				Some(record),
			),
			Err(e) => Outcome::failed(&self.descriptor.title, e),
		}
	}

	/// Removes record `id`.
	pub async fn submit_remove(&self, id: &RecordId) -> Outcome {
		match self.executor.remove(self.key(), id).await {
			Ok(()) => Outcome::applied(OutcomeKind::Removed, format!("{}: record {id} removed", self.descriptor.title), None),
			Err(e) => Outcome::failed(&self.descriptor.title, e),
		}
	}
}

#[cfg(test)]
mod tests;
