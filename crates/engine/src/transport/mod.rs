//! REST collaborator boundary.
//!
//! Per dataset, at its endpoint path:
//!
//! | Call | Request | Response |
//! |---|---|---|
//! | [`Transport::list`] | `GET endpoint` | JSON array of records, each with `id` |
//! | [`Transport::create`] | `POST endpoint` with a payload without `id` | the stored record |
//! | [`Transport::update`] | `PUT endpoint/{id}` with a payload without `no` | the stored record |
//! | [`Transport::delete`] | `DELETE endpoint/{id}` | any 2xx |
//!
//! Implementations report a missing record as [`TransportError::NotFound`] and
//! every other non-2xx as [`TransportError::Status`]. No call is retried here.

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::record::{Payload, Record, RecordId};

/// Async REST collaborator used by the cache and the mutation executor.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Lists every record of the collection at `endpoint`, in server order.
	async fn list(&self, endpoint: &str) -> Result<Vec<Record>, TransportError>;

	/// Creates a record and returns it with its server-assigned id.
	async fn create(&self, endpoint: &str, payload: &Payload) -> Result<Record, TransportError>;

	/// Replaces the record `id` and returns the stored result.
	async fn update(&self, endpoint: &str, id: &RecordId, payload: &Payload) -> Result<Record, TransportError>;

	/// Deletes the record `id`.
	async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), TransportError>;
}

/// Path of a single record below a collection endpoint.
pub(crate) fn record_path(endpoint: &str, id: &RecordId) -> String {
	format!("{}/{}", endpoint.trim_end_matches('/'), id)
}
