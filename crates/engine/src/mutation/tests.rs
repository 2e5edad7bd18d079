use serde_json::json;

use super::*;
use crate::cache::FetchStatus;
use crate::test_support::{ids, record, registry, row};
use crate::transport::memory::{MemoryTransport, TransportRequest};

fn setup() -> (Arc<MemoryTransport>, CacheStore, MutationExecutor) {
	let transport = Arc::new(MemoryTransport::with_id_prefix("s"));
	let cache = CacheStore::new(registry(), transport.clone());
	let executor = MutationExecutor::new(transport.clone(), cache.clone());
	(transport, cache, executor)
}

fn salary() -> Row {
	row(json!({"no": 3, "name": "A", "amount": 100, "date": "2025-01-01"}))
}

#[tokio::test]
async fn create_posts_stripped_payload_and_invalidates() {
	let (transport, cache, executor) = setup();
	cache.settled("salaries").await.unwrap();

	let created = executor.create("salaries", &salary()).await.unwrap();
	assert_eq!(created.id.as_str(), "s1");

	let posted = transport
		.requests()
		.into_iter()
		.find_map(|r| match r {
			TransportRequest::Create { payload, .. } => Some(payload),
			_ => None,
		})
		.unwrap();
	assert_eq!(serde_json::Value::Object(posted), json!({"name": "A", "amount": 100, "date": "2025-01-01"}));

	let entry = cache.settled("salaries").await.unwrap();
	assert_eq!(ids(&entry.records), ["s1"]);
}

#[tokio::test]
async fn invalid_payload_never_reaches_transport() {
	let (transport, _cache, executor) = setup();
	let err = executor.create("salaries", &row(json!({"name": "A"}))).await.unwrap_err();
	assert!(matches!(err, Error::InvalidPayload { .. }));
	assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn failed_create_leaves_cache_untouched() {
	let (transport, cache, executor) = setup();
	transport.seed("/salaries", [record("s9", json!({"name": "Z", "amount": 1, "date": "2024-12-31"}))]);
	let before = cache.settled("salaries").await.unwrap();

	transport.fail_next(TransportError::Status {
		status: 422,
		message: Some("amount too large".into()),
	});
	let err = executor.create("salaries", &salary()).await.unwrap_err();
	assert_eq!(
		err,
		Error::MutationFailed {
			operation: Operation::Create,
			key: "salaries".into(),
			cause: TransportError::Status {
				status: 422,
				message: Some("amount too large".into()),
			},
		}
	);

	let after = cache.get("salaries").unwrap();
	assert!(!after.revalidating);
	assert_eq!(after.status, FetchStatus::Ready);
	assert_eq!(ids(&after.records), ids(&before.records));
}

#[tokio::test]
async fn update_addresses_record_by_id() {
	let (transport, cache, executor) = setup();
	transport.seed("/salaries", [record("s1", json!({"name": "A", "amount": 100, "date": "2025-01-01"}))]);
	let rows = crate::projector::project(&cache.settled("salaries").await.unwrap().records);

	let mut edited = rows[0].to_row();
	edited.insert("amount".into(), json!("150"));
	let id = rows[0].id().clone();
	let updated = executor.update("salaries", &id, &edited).await.unwrap();
	assert_eq!(updated.get("amount"), Some(&json!(150)));

	let entry = cache.settled("salaries").await.unwrap();
	assert_eq!(entry.records[0].get("amount"), Some(&json!(150)));
	assert!(transport.requests().iter().any(|r| matches!(r, TransportRequest::Update { id, payload, .. } if id.as_str() == "s1" && !payload.contains_key("no"))));
}

#[tokio::test]
async fn update_of_missing_record_reports_not_found_and_refetches() {
	let (transport, cache, executor) = setup();
	transport.seed("/salaries", [record("s1", json!({"name": "A", "amount": 1, "date": "2025-01-01"}))]);
	cache.settled("salaries").await.unwrap();
	transport.delete_behind("/salaries", &RecordId::new("s1"));

	let id = RecordId::new("s1");
	let err = executor.update("salaries", &id, &salary()).await.unwrap_err();
	assert_eq!(err, Error::RecordNotFound { key: "salaries".into(), id });

	let entry = cache.settled("salaries").await.unwrap();
	assert!(entry.records.is_empty());
}

#[tokio::test]
async fn remove_twice_reports_not_found() {
	let (transport, cache, executor) = setup();
	transport.seed("/salaries", [record("s1", json!({"name": "A", "amount": 1, "date": "2025-01-01"}))]);
	cache.settled("salaries").await.unwrap();

	let id = RecordId::new("s1");
	executor.remove("salaries", &id).await.unwrap();
	assert!(cache.settled("salaries").await.unwrap().records.is_empty());

	let err = executor.remove("salaries", &id).await.unwrap_err();
	assert!(matches!(err, Error::RecordNotFound { .. }));
	assert!(!err.is_retryable());
}

#[tokio::test]
async fn transport_failures_are_single_attempt() {
	let (transport, _cache, executor) = setup();
	transport.fail_next(TransportError::Network("reset".into()));
	let err = executor.remove("salaries", &RecordId::new("s1")).await.unwrap_err();
	assert!(err.is_retryable());
	let deletes = transport.requests().iter().filter(|r| matches!(r, TransportRequest::Delete { .. })).count();
	assert_eq!(deletes, 1);
}

#[tokio::test]
async fn unknown_resource_is_fatal() {
	let (_transport, _cache, executor) = setup();
	let err = executor.create("payroll", &salary()).await.unwrap_err();
	assert!(err.is_fatal());
}
