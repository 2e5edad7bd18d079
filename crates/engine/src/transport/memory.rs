//! In-process transport.
//!
//! Stores collections in memory and assigns ids from a counter. Used for
//! tests and demos, and as a stand-in server when developing renderers.
//! Every call is recorded so callers can inspect exactly what went over the
//! boundary.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Transport;
use crate::error::TransportError;
use crate::record::{Fields, Payload, Record, RecordId};

/// One call received by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportRequest {
	/// `GET endpoint`.
	List {
		/// Collection endpoint.
		endpoint: String,
	},
	/// `POST endpoint`.
	Create {
		/// Collection endpoint.
		endpoint: String,
		/// Body as received.
		payload: Fields,
	},
	/// `PUT endpoint/{id}`.
	Update {
		/// Collection endpoint.
		endpoint: String,
		/// Addressed record.
		id: RecordId,
		/// Body as received.
		payload: Fields,
	},
	/// `DELETE endpoint/{id}`.
	Delete {
		/// Collection endpoint.
		endpoint: String,
		/// Addressed record.
		id: RecordId,
	},
}

#[derive(Debug, Default)]
struct MemoryState {
	collections: HashMap<String, Vec<Record>>,
	next_id: u64,
	requests: Vec<TransportRequest>,
	failures: VecDeque<TransportError>,
}

/// In-memory [`Transport`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
	id_prefix: String,
	state: Mutex<MemoryState>,
}

impl MemoryTransport {
	/// Creates an empty transport issuing ids `1`, `2`, ...
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty transport issuing ids `{prefix}1`, `{prefix}2`, ...
	pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
		Self {
			id_prefix: prefix.into(),
			state: Mutex::default(),
		}
	}

	/// Replaces the contents of a collection.
	pub fn seed(&self, endpoint: &str, records: impl IntoIterator<Item = Record>) {
		self.state.lock().collections.insert(normalize(endpoint), records.into_iter().collect());
	}

	/// Returns the current contents of a collection.
	pub fn records(&self, endpoint: &str) -> Vec<Record> {
		self.state.lock().collections.get(&normalize(endpoint)).cloned().unwrap_or_default()
	}

	/// Deletes a record without going through the request log, as another
	/// client would. Returns false if it did not exist.
	pub fn delete_behind(&self, endpoint: &str, id: &RecordId) -> bool {
		let mut state = self.state.lock();
		let Some(records) = state.collections.get_mut(&normalize(endpoint)) else {
			return false;
		};
		let before = records.len();
		records.retain(|r| &r.id != id);
		records.len() != before
	}

	/// Makes the next call fail with `error`. Queued failures are consumed in order.
	pub fn fail_next(&self, error: TransportError) {
		self.state.lock().failures.push_back(error);
	}

	/// Returns every call received so far.
	pub fn requests(&self) -> Vec<TransportRequest> {
		self.state.lock().requests.clone()
	}

	fn begin(&self, request: TransportRequest) -> Result<parking_lot::MutexGuard<'_, MemoryState>, TransportError> {
		let mut state = self.state.lock();
		state.requests.push(request);
		match state.failures.pop_front() {
			Some(error) => Err(error),
			None => Ok(state),
		}
	}
}

fn normalize(endpoint: &str) -> String {
	endpoint.trim_end_matches('/').to_string()
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn list(&self, endpoint: &str) -> Result<Vec<Record>, TransportError> {
		let state = self.begin(TransportRequest::List {
			endpoint: endpoint.to_string(),
		})?;
		Ok(state.collections.get(&normalize(endpoint)).cloned().unwrap_or_default())
	}

	async fn create(&self, endpoint: &str, payload: &Payload) -> Result<Record, TransportError> {
		let mut state = self.begin(TransportRequest::Create {
			endpoint: endpoint.to_string(),
			payload: payload.fields().clone(),
		})?;
		state.next_id += 1;
		let id = RecordId::new(format!("{}{}", self.id_prefix, state.next_id));
		let record = Record::new(id, payload.fields().clone());
		state.collections.entry(normalize(endpoint)).or_default().push(record.clone());
		Ok(record)
	}

	async fn update(&self, endpoint: &str, id: &RecordId, payload: &Payload) -> Result<Record, TransportError> {
		let mut state = self.begin(TransportRequest::Update {
			endpoint: endpoint.to_string(),
			id: id.clone(),
			payload: payload.fields().clone(),
		})?;
		let slot = state
			.collections
			.get_mut(&normalize(endpoint))
			.and_then(|records| records.iter_mut().find(|r| &r.id == id))
			.ok_or(TransportError::NotFound)?;
		*slot = Record::new(id.clone(), payload.fields().clone());
		Ok(slot.clone())
	}

	async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), TransportError> {
		let mut state = self.begin(TransportRequest::Delete {
			endpoint: endpoint.to_string(),
			id: id.clone(),
		})?;
		let records = state.collections.get_mut(&normalize(endpoint)).ok_or(TransportError::NotFound)?;
		let before = records.len();
		records.retain(|r| &r.id != id);
		if records.len() == before {
			return Err(TransportError::NotFound);
		}
		Ok(())
	}
}
