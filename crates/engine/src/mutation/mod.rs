//! Create/update/delete against a dataset's endpoint.
//!
//! Each call is one network attempt. On success the resource's cache entry is
//! invalidated so the next read reflects server state; the executor never
//! writes records into the cache itself. A missing record also invalidates,
//! since it means the cached list shows a row that is already gone.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::dataset::DatasetDescriptor;
use crate::error::{Error, Operation, Result, TransportError};
use crate::projector::{StripMode, strip};
use crate::record::{Record, RecordId, Row};
use crate::transport::Transport;

/// Issues writes and keeps the [`CacheStore`] consistent with them.
#[derive(Clone)]
pub struct MutationExecutor {
	transport: Arc<dyn Transport>,
	cache: CacheStore,
}

impl MutationExecutor {
	/// Creates an executor writing through `transport` and invalidating `cache`.
	pub fn new(transport: Arc<dyn Transport>, cache: CacheStore) -> Self {
		Self { transport, cache }
	}

	fn descriptor(&self, key: &str) -> Result<Arc<DatasetDescriptor>> {
		self.cache.registry().lookup(key)
	}

	/// Creates a record from `row` and returns it with its server-assigned id.
	///
	/// # Errors
	///
	/// * [`Error::InvalidPayload`] if the row cannot be stripped for create.
	/// * [`Error::MutationFailed`] if the server rejects it; the cache is untouched.
	pub async fn create(&self, key: &str, row: &Row) -> Result<Record> {
		let descriptor = self.descriptor(key)?;
		let payload = strip(&descriptor, row, StripMode::Create)?;

		debug!(resource = %key, "mutation.create");
		match self.transport.create(&descriptor.endpoint, &payload).await {
			Ok(record) => {
				debug!(resource = %key, id = %record.id, "mutation.create.done");
				self.cache.invalidate(key)?;
				Ok(record)
			}
			Err(cause) => Err(Self::failed(Operation::Create, key, None, cause)),
		}
	}

	/// Replaces record `id` with the schema fields of `row`.
	///
	/// # Errors
	///
	/// * [`Error::InvalidPayload`] if the row cannot be stripped for update.
	/// * [`Error::RecordNotFound`] if the server no longer has `id`; the cache is invalidated.
	/// * [`Error::MutationFailed`] for any other failure; the cache is untouched.
	pub async fn update(&self, key: &str, id: &RecordId, row: &Row) -> Result<Record> {
		let descriptor = self.descriptor(key)?;
		let payload = strip(&descriptor, row, StripMode::Update(id))?;

		debug!(resource = %key, %id, "mutation.update");
		match self.transport.update(&descriptor.endpoint, id, &payload).await {
			Ok(record) => {
				self.cache.invalidate(key)?;
				Ok(record)
			}
			Err(TransportError::NotFound) => Err(self.not_found(Operation::Update, key, id)),
			Err(cause) => Err(Self::failed(Operation::Update, key, Some(id), cause)),
		}
	}

	/// Deletes record `id`.
	///
	/// Deleting an id that is already gone fails with [`Error::RecordNotFound`];
	/// callers should treat that as already satisfied rather than retry.
	///
	/// # Errors
	///
	/// * [`Error::RecordNotFound`] if the server no longer has `id`; the cache is invalidated.
	/// * [`Error::MutationFailed`] for any other failure; the cache is untouched.
	pub async fn remove(&self, key: &str, id: &RecordId) -> Result<()> {
		let descriptor = self.descriptor(key)?;

		debug!(resource = %key, %id, "mutation.remove");
		match self.transport.delete(&descriptor.endpoint, id).await {
			Ok(()) => {
				self.cache.invalidate(key)?;
				Ok(())
			}
			Err(TransportError::NotFound) => Err(self.not_found(Operation::Remove, key, id)),
			Err(cause) => Err(Self::failed(Operation::Remove, key, Some(id), cause)),
		}
	}

	fn not_found(&self, operation: Operation, key: &str, id: &RecordId) -> Error {
		warn!(resource = %key, %id, %operation, "mutation.not_found");
		if let Err(e) = self.cache.invalidate(key) {
			warn!(resource = %key, error = %e, "mutation.invalidate.failed");
		}
		Error::RecordNotFound {
			key: key.to_string(),
			id: id.clone(),
		}
	}

	fn failed(operation: Operation, key: &str, id: Option<&RecordId>, cause: TransportError) -> Error {
		warn!(resource = %key, id = ?id.map(RecordId::as_str), %operation, error = %cause, "mutation.failed");
		Error::MutationFailed {
			operation,
			key: key.to_string(),
			cause,
		}
	}
}

#[cfg(test)]
mod tests;
