//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Notify, oneshot};

use crate::dataset::{DatasetDescriptor, DatasetRegistry};
use crate::error::TransportError;
use crate::record::{Payload, Record, RecordId, Row};
use crate::transport::Transport;
use crate::transport::memory::MemoryTransport;

type ListReply = Result<Vec<Record>, TransportError>;

/// Transport whose list calls block until the test resolves them one by one.
///
/// Writes go straight to an inner [`MemoryTransport`].
#[derive(Default)]
pub(crate) struct GatedTransport {
	lists: Mutex<Vec<Option<oneshot::Sender<ListReply>>>>,
	issued: Notify,
	pub writes: MemoryTransport,
}

impl GatedTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Number of list calls that reached the transport.
	pub fn list_calls(&self) -> usize {
		self.lists.lock().len()
	}

	/// Waits until at least `n` list calls reached the transport.
	pub async fn wait_for_lists(&self, n: usize) {
		loop {
			let notified = self.issued.notified();
			if self.list_calls() >= n {
				return;
			}
			notified.await;
		}
	}

	/// Answers list call `index`. Returns false if the caller already went away.
	pub fn resolve(&self, index: usize, reply: ListReply) -> bool {
		let tx = self.lists.lock().get_mut(index).and_then(Option::take);
		tx.is_some_and(|tx| tx.send(reply).is_ok())
	}
}

#[async_trait]
impl Transport for GatedTransport {
	async fn list(&self, _endpoint: &str) -> Result<Vec<Record>, TransportError> {
		let (tx, rx) = oneshot::channel();
		self.lists.lock().push(Some(tx));
		self.issued.notify_waiters();
		rx.await.unwrap_or_else(|_| Err(TransportError::Network("list reply dropped".into())))
	}

	async fn create(&self, endpoint: &str, payload: &Payload) -> Result<Record, TransportError> {
		self.writes.create(endpoint, payload).await
	}

	async fn update(&self, endpoint: &str, id: &RecordId, payload: &Payload) -> Result<Record, TransportError> {
		self.writes.update(endpoint, id, payload).await
	}

	async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), TransportError> {
		self.writes.delete(endpoint, id).await
	}
}

pub(crate) fn salaries() -> DatasetDescriptor {
	DatasetDescriptor::new("salaries", "Salaries", "/salaries")
		.text("name", "Name")
		.number("amount", "Amount")
		.date("date", "Date")
}

pub(crate) fn registry() -> Arc<DatasetRegistry> {
	Arc::new(DatasetRegistry::from_descriptors([salaries()]).expect("fixture registry"))
}

pub(crate) fn row(value: Value) -> Row {
	match value {
		Value::Object(map) => map,
		other => panic!("not an object: {other}"),
	}
}

pub(crate) fn record(id: &str, value: Value) -> Record {
	Record::new(id, row(value))
}

pub(crate) fn ids(records: &[Record]) -> Vec<&str> {
	records.iter().map(|r| r.id.as_str()).collect()
}
