//! Error taxonomy for the engine and its transport boundary.

use std::fmt;

use crate::record::RecordId;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Write operation issued by the [`crate::MutationExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	/// `POST endpoint`.
	Create,
	/// `PUT endpoint/{id}`.
	Update,
	/// `DELETE endpoint/{id}`.
	Remove,
}

impl Operation {
	/// Returns a stable lowercase name for logs and notices.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::Update => "update",
			Self::Remove => "remove",
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Failures reported by a [`crate::Transport`].
///
/// Cloneable so that a single fetch outcome can be shared by every reader
/// waiting on the same in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
	/// The server reported that the addressed record does not exist.
	#[error("not found")]
	NotFound,
	/// Any other non-2xx response.
	#[error("server responded with status {status}: {}", message.as_deref().unwrap_or("no message"))]
	Status {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body, when present.
		message: Option<String>,
	},
	/// The request never produced a response.
	#[error("network error: {0}")]
	Network(String),
	/// The response body could not be decoded.
	#[error("undecodable response: {0}")]
	Decode(String),
	/// The response decoded but violates the REST contract (e.g. a record without `id`).
	#[error("contract violation: {0}")]
	Contract(String),
	/// The transport could not be set up.
	#[error("transport configuration: {0}")]
	Config(String),
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// A resource key was used without being registered.
	#[error("unknown resource `{key}`")]
	UnknownResource {
		/// The unregistered key.
		key: String,
	},
	/// Two descriptors share one resource key.
	#[error("resource `{key}` is already registered")]
	DuplicateResource {
		/// The duplicated key.
		key: String,
	},
	/// A descriptor is malformed and cannot be registered.
	#[error("invalid descriptor `{key}`: {reason}")]
	InvalidDescriptor {
		/// Resource key of the rejected descriptor.
		key: String,
		/// What is wrong with it.
		reason: String,
	},
	/// A submitted row cannot be turned into a write payload.
	#[error("invalid payload for `{key}`: {reason}")]
	InvalidPayload {
		/// Resource key the row was submitted to.
		key: String,
		/// What is wrong with the row.
		reason: String,
	},
	/// Listing a resource failed.
	#[error("fetching `{key}` failed: {cause}")]
	FetchFailed {
		/// Resource key.
		key: String,
		/// Underlying transport failure.
		cause: TransportError,
	},
	/// A create/update/remove failed for a reason other than a missing record.
	#[error("{operation} on `{key}` failed: {cause}")]
	MutationFailed {
		/// The attempted operation.
		operation: Operation,
		/// Resource key.
		key: String,
		/// Underlying transport failure.
		cause: TransportError,
	},
	/// The addressed record no longer exists on the server.
	#[error("record `{id}` of `{key}` not found")]
	RecordNotFound {
		/// Resource key.
		key: String,
		/// The missing record id.
		id: RecordId,
	},
}

impl Error {
	/// Returns true for programming errors that must abort initialization.
	pub const fn is_fatal(&self) -> bool {
		matches!(self, Self::UnknownResource { .. } | Self::DuplicateResource { .. } | Self::InvalidDescriptor { .. })
	}

	/// Returns true when repeating the same call may succeed.
	pub const fn is_retryable(&self) -> bool {
		matches!(self, Self::FetchFailed { .. } | Self::MutationFailed { .. })
	}
}
