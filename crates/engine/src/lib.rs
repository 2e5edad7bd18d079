//! Generic tabular CRUD synchronization engine.
//!
//! Every table of the dashboard follows the same life cycle: fetch a list from a
//! REST endpoint, render it with a display-only sequence number, and push
//! add/edit/delete intents back through the same endpoint family before
//! refetching. This crate implements that life cycle once, parameterized by a
//! [`DatasetDescriptor`]:
//! * [`DatasetRegistry`]: startup-populated, read-only set of descriptors
//! * [`projector`]: adds the derived `no` column and strips it before writes
//! * [`CacheStore`]: per-resource snapshots with singleflight fetches and
//!   stale-response discard
//! * [`MutationExecutor`]: create/update/delete followed by invalidation
//! * [`TableController`]: the renderer-facing boundary that turns failures into
//!   [`Outcome`]s instead of errors
//!
//! The REST collaborator sits behind the [`Transport`] trait. [`HttpTransport`]
//! (feature `http`, enabled by default) talks to a real server and
//! [`MemoryTransport`] keeps everything in process.
//!
//! All fetches are spawned on the ambient Tokio runtime, so the engine must be
//! driven from within one.

#![warn(missing_docs)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod mutation;
pub mod projector;
pub mod record;
pub mod table;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CacheStore, FetchStatus};
pub use config::{ConfigError, EngineConfig};
pub use dataset::{ColumnDescriptor, DatasetDescriptor, DatasetRegistry, RegistryBuilder, UpdateIdPolicy, ValueKind};
pub use engine::Engine;
pub use error::{Error, Operation, Result, TransportError};
pub use mutation::MutationExecutor;
pub use projector::{ProjectedRow, StripMode, project, strip};
pub use record::{Fields, Payload, Record, RecordId, Row};
pub use table::{Level, Notice, Outcome, OutcomeKind, TableController, TableView};
#[cfg(feature = "http")]
pub use transport::http::HttpTransport;
pub use transport::memory::{MemoryTransport, TransportRequest};
pub use transport::Transport;
