//! Per-resource list cache with singleflight fetches.
//!
//! # Purpose
//!
//! Hold the last known list of every resource the renderer has asked for, and
//! own the only path by which that list changes: a `GET` issued through the
//! [`Transport`].
//!
//! # Mental model
//!
//! * One slot per resource key, created lazily by the first [`CacheStore::get`].
//! * Every fetch is stamped with a generation drawn from one store-wide counter,
//!   so numbers never repeat, not even across an `evict` and a recreated slot.
//!   A response is applied only if its generation is still the latest one
//!   issued for that key.
//! * Issuing a fetch cancels the previous one, so at most one list request per
//!   key is outstanding.
//! * Readers get cloned [`CacheEntry`] snapshots; records are shared behind an
//!   `Arc` so snapshots are cheap.
//!
//! # Lifecycle
//!
//! | From | Event | To |
//! |---|---|---|
//! | (absent) | `get` / `subscribe` / `invalidate` | `Loading` |
//! | `Loading` | fetch ok / err | `Ready` / `Error` |
//! | `Ready` / `Error` | `invalidate` | unchanged status, `revalidating = true` (loading, see [`CacheEntry::is_loading`]) |
//! | revalidating | fetch ok / err | `Ready` / `Error`, `revalidating = false` |
//! | any | `evict` | (absent), in-flight fetch cancelled |
//!
//! While revalidating, readers keep the previous snapshot (stale-while-revalidate).
//! A failed fetch never clears records that were already loaded.
//!
//! # Concurrency & ordering
//!
//! * Slot state sits behind one `parking_lot::Mutex` that is never held across
//!   an await point.
//! * Each slot publishes through a `watch` channel; [`CacheStore::settled`]
//!   waits on it, so concurrent waiters share the outcome of the same fetch.
//! * Keys are independent: no ordering is kept between resources.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dataset::{DatasetDescriptor, DatasetRegistry};
use crate::error::{Error, Result, TransportError};
use crate::record::Record;
use crate::transport::Transport;

/// Fetch status of a cache entry as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchStatus {
	/// Nothing requested yet.
	#[default]
	Idle,
	/// First fetch in flight, no records yet.
	Loading,
	/// Records reflect the last successful fetch.
	Ready,
	/// The last fetch failed; records are the last good list, if any.
	Error,
}

/// Snapshot of one resource's cached list.
#[derive(Debug, Clone)]
pub struct CacheEntry {
	/// Resource key.
	pub key: String,
	/// Records in server order.
	pub records: Arc<[Record]>,
	/// Status readers should act on.
	pub status: FetchStatus,
	/// The failure behind [`FetchStatus::Error`].
	pub last_error: Option<Error>,
	/// A refetch is in flight behind this snapshot.
	pub revalidating: bool,
}

impl CacheEntry {
	fn idle(key: &str) -> Self {
		Self {
			key: key.to_string(),
			records: Arc::from(Vec::new()),
			status: FetchStatus::Idle,
			last_error: None,
			revalidating: false,
		}
	}

	/// Returns true while any fetch for the entry is outstanding.
	pub fn is_loading(&self) -> bool {
		self.status == FetchStatus::Loading || self.revalidating
	}

	/// Returns true once the most recently issued fetch has resolved.
	pub fn is_settled(&self) -> bool {
		!self.is_loading() && self.status != FetchStatus::Idle
	}
}

struct Slot {
	descriptor: Arc<DatasetDescriptor>,
	entry: CacheEntry,
	/// Generation of the most recently issued fetch.
	generation: u64,
	/// Cancels the in-flight fetch, if any.
	cancel: Option<CancellationToken>,
	tx: watch::Sender<CacheEntry>,
}

impl Slot {
	fn new(descriptor: Arc<DatasetDescriptor>) -> Self {
		let entry = CacheEntry::idle(&descriptor.key);
		let (tx, _) = watch::channel(entry.clone());
		Self {
			descriptor,
			entry,
			generation: 0,
			cancel: None,
			tx,
		}
	}

	fn publish(&self) {
		self.tx.send_replace(self.entry.clone());
	}
}

struct Inner {
	registry: Arc<DatasetRegistry>,
	transport: Arc<dyn Transport>,
	slots: Mutex<HashMap<String, Slot>>,
	/// Last generation handed out, shared by every slot.
	generations: AtomicU64,
}

/// Process-local cache of resource lists.
///
/// Cheap to clone; clones share the same slots. Fetches are spawned on the
/// ambient Tokio runtime.
#[derive(Clone)]
pub struct CacheStore {
	inner: Arc<Inner>,
}

impl CacheStore {
	/// Creates an empty store over `registry`, fetching through `transport`.
	pub fn new(registry: Arc<DatasetRegistry>, transport: Arc<dyn Transport>) -> Self {
		Self {
			inner: Arc::new(Inner {
				registry,
				transport,
				slots: Mutex::new(HashMap::new()),
				generations: AtomicU64::new(0),
			}),
		}
	}

	/// Returns the registry the store resolves keys against.
	pub fn registry(&self) -> &Arc<DatasetRegistry> {
		&self.inner.registry
	}

	/// Returns the current snapshot for `key`, starting the first fetch if the
	/// resource was never requested.
	///
	/// Never waits: a fresh entry is returned in [`FetchStatus::Loading`].
	///
	/// # Errors
	///
	/// [`Error::UnknownResource`] if `key` is not registered.
	pub fn get(&self, key: &str) -> Result<CacheEntry> {
		self.with_slot(key, |slot| slot.entry.clone())
	}

	/// Returns the snapshot once the most recently issued fetch for `key` has
	/// resolved, starting one if the resource was never requested.
	///
	/// Callers arriving while a fetch is in flight share its outcome. If the key
	/// is invalidated again meanwhile, the wait extends to the newer fetch.
	pub async fn settled(&self, key: &str) -> Result<CacheEntry> {
		let mut rx = self.subscribe(key)?;
		loop {
			{
				let entry = rx.borrow_and_update();
				if entry.is_settled() {
					return Ok(entry.clone());
				}
			}
			if rx.changed().await.is_err() {
				// Slot evicted while waiting.
				return Ok(rx.borrow().clone());
			}
		}
	}

	/// Subscribes to every snapshot published for `key`, starting the first
	/// fetch if needed.
	pub fn subscribe(&self, key: &str) -> Result<watch::Receiver<CacheEntry>> {
		self.with_slot(key, |slot| slot.tx.subscribe())
	}

	/// Returns the snapshot for `key` without creating an entry or fetching.
	pub fn peek(&self, key: &str) -> Option<CacheEntry> {
		self.inner.slots.lock().get(key).map(|slot| slot.entry.clone())
	}

	/// Returns the status of `key`, [`FetchStatus::Idle`] if never requested.
	pub fn status(&self, key: &str) -> FetchStatus {
		self.peek(key).map_or(FetchStatus::Idle, |entry| entry.status)
	}

	/// Marks `key` stale and re-issues its list fetch, regardless of status.
	///
	/// A fetch already in flight for `key` is cancelled and its response, should
	/// it still arrive, is discarded.
	pub fn invalidate(&self, key: &str) -> Result<()> {
		let descriptor = self.inner.registry.lookup(key)?;
		let mut slots = self.inner.slots.lock();
		let slot = slots.entry(key.to_string()).or_insert_with(|| Slot::new(descriptor));
		self.inner.begin_fetch(slot);
		Ok(())
	}

	/// Drops the entry for `key`, cancelling its in-flight fetch. Returns false
	/// if there was none.
	pub fn evict(&self, key: &str) -> bool {
		let removed = self.inner.slots.lock().remove(key);
		match removed {
			Some(slot) => {
				if let Some(cancel) = slot.cancel {
					cancel.cancel();
				}
				debug!(resource = %key, "cache.evict");
				true
			}
			None => false,
		}
	}

	/// Drops every entry and cancels all in-flight fetches.
	pub fn clear(&self) {
		let slots = std::mem::take(&mut *self.inner.slots.lock());
		for (_, slot) in slots {
			if let Some(cancel) = slot.cancel {
				cancel.cancel();
			}
		}
	}

	fn with_slot<T>(&self, key: &str, f: impl FnOnce(&Slot) -> T) -> Result<T> {
		let mut slots = self.inner.slots.lock();
		if let Some(slot) = slots.get(key) {
			return Ok(f(slot));
		}

		let descriptor = self.inner.registry.lookup(key)?;
		let slot = slots.entry(key.to_string()).or_insert_with(|| Slot::new(descriptor));
		self.inner.begin_fetch(slot);
		Ok(f(slot))
	}
}

impl Inner {
	/// Issues a new generation of the list fetch for `slot`.
	fn begin_fetch(self: &Arc<Self>, slot: &mut Slot) {
		if let Some(previous) = slot.cancel.take() {
			previous.cancel();
		}

		let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
		slot.generation = generation;
		let token = CancellationToken::new();
		slot.cancel = Some(token.clone());

		match slot.entry.status {
			FetchStatus::Idle | FetchStatus::Loading => slot.entry.status = FetchStatus::Loading,
			FetchStatus::Ready | FetchStatus::Error => slot.entry.revalidating = true,
		}
		slot.publish();

		let key = slot.descriptor.key.clone();
		let endpoint = slot.descriptor.endpoint.clone();
		debug!(resource = %key, generation, "cache.fetch.issue");

		let inner = Arc::clone(self);
		tokio::spawn(async move {
			let result = tokio::select! {
				biased;
				() = token.cancelled() => {
					debug!(resource = %key, generation, "cache.fetch.cancelled");
					return;
				}
				result = inner.transport.list(&endpoint) => result,
			};
			inner.apply(&key, generation, result);
		});
	}

	/// Applies a fetch result if it belongs to the latest generation for `key`.
	fn apply(&self, key: &str, generation: u64, result: Result<Vec<Record>, TransportError>) {
		let mut slots = self.slots.lock();
		let Some(slot) = slots.get_mut(key) else {
			debug!(resource = %key, generation, "cache.fetch.orphaned");
			return;
		};
		if slot.generation != generation {
			debug!(resource = %key, generation, latest = slot.generation, "cache.fetch.stale");
			return;
		}

		slot.cancel = None;
		slot.entry.revalidating = false;
		match result {
			Ok(records) => {
				debug!(resource = %key, generation, count = records.len(), "cache.fetch.applied");
				slot.entry.records = Arc::from(records);
				slot.entry.status = FetchStatus::Ready;
				slot.entry.last_error = None;
			}
			Err(cause) => {
				warn!(resource = %key, generation, error = %cause, "cache.fetch.failed");
				slot.entry.status = FetchStatus::Error;
				slot.entry.last_error = Some(Error::FetchFailed {
					key: key.to_string(),
					cause,
				});
			}
		}
		slot.publish();
	}
}
