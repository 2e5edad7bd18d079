use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::error::TransportError;
use crate::test_support::{GatedTransport, record, registry, row};
use crate::transport::memory::MemoryTransport;

fn table(transport: Arc<MemoryTransport>) -> TableController {
	let cache = CacheStore::new(registry(), transport.clone());
	let executor = MutationExecutor::new(transport, cache.clone());
	TableController::new("salaries", cache, executor).unwrap()
}

fn seeded() -> (Arc<MemoryTransport>, TableController) {
	let transport = Arc::new(MemoryTransport::with_id_prefix("n"));
	transport.seed(
		"/salaries",
		[
			record("s1", json!({"name": "A", "amount": 100, "date": "2025-01-01"})),
			record("s2", json!({"name": "B", "amount": 200, "date": "2025-02-01"})),
		],
	);
	let table = table(transport.clone());
	(transport, table)
}

#[tokio::test]
async fn unknown_table_is_rejected() {
	let transport = Arc::new(MemoryTransport::new());
	let cache = CacheStore::new(registry(), transport.clone());
	let executor = MutationExecutor::new(transport, cache.clone());
	assert!(TableController::new("payroll", cache, executor).is_err());
}

#[tokio::test]
async fn current_rows_are_numbered_in_server_order() {
	let (_transport, table) = seeded();
	let rows = table.current_rows().await;
	let numbered: Vec<_> = rows.iter().map(|r| (r.no, r.id().as_str())).collect();
	assert_eq!(numbered, [(1, "s1"), (2, "s2")]);
	assert_eq!(table.columns().len(), 3);
}

#[tokio::test]
async fn rows_now_does_not_wait() {
	let transport = GatedTransport::new();
	let cache = CacheStore::new(registry(), transport.clone());
	let executor = MutationExecutor::new(transport.clone(), cache.clone());
	let table = TableController::new("salaries", cache, executor).unwrap();

	assert!(table.rows_now().is_empty());
	transport.wait_for_lists(1).await;
	transport.resolve(0, Ok(vec![record("s1", json!({}))]));
	assert_eq!(table.current_rows().await.len(), 1);
}

#[tokio::test]
async fn add_reports_created_record() {
	let (_transport, table) = seeded();
	table.current_rows().await;

	let outcome = table
		.submit_add(&row(json!({"name": "C", "amount": "300", "date": "2025-03-01"})))
		.await;
	assert_eq!(outcome.kind, OutcomeKind::Created);
	assert_eq!(outcome.notice.level, Level::Success);
	assert!(outcome.is_success());
	let created = outcome.record.unwrap();
	assert_eq!(created.id.as_str(), "n1");

	let rows = table.current_rows().await;
	assert_eq!(rows.len(), 3);
	assert_eq!(rows[2].no, 3);
	assert_eq!(rows[2].get("amount"), Some(&json!(300)));
}

#[tokio::test]
async fn invalid_row_keeps_form_state() {
	let (_transport, table) = seeded();
	let outcome = table.submit_add(&row(json!({"name": "C", "amount": "lots", "date": "2025-03-01"}))).await;
	assert_eq!(outcome.kind, OutcomeKind::InvalidPayload);
	assert_eq!(outcome.notice.level, Level::Warn);
	assert!(!outcome.is_retryable());
	assert!(outcome.notice.message.starts_with("Salaries: "));
}

#[tokio::test]
async fn edit_updates_the_addressed_row() {
	let (_transport, table) = seeded();
	let rows = table.current_rows().await;
	let mut edited = rows[1].to_row();
	edited.insert("name".into(), json!("Bee"));

	let outcome = table.submit_edit(rows[1].id(), &edited).await;
	assert_eq!(outcome.kind, OutcomeKind::Updated);

	let rows = table.current_rows().await;
	assert_eq!(rows[1].get("name"), Some(&json!("Bee")));
	assert_eq!(rows[1].no, 2);
}

#[tokio::test]
async fn remove_renumbers_remaining_rows() {
	let (_transport, table) = seeded();
	table.current_rows().await;

	let outcome = table.submit_remove(&RecordId::new("s1")).await;
	assert_eq!(outcome.kind, OutcomeKind::Removed);
	assert!(outcome.record.is_none());

	let rows = table.current_rows().await;
	let numbered: Vec<_> = rows.iter().map(|r| (r.no, r.id().as_str())).collect();
	assert_eq!(numbered, [(1, "s2")]);
}

#[tokio::test]
async fn server_failure_is_retryable() {
	let (transport, table) = seeded();
	table.current_rows().await;
	transport.fail_next(TransportError::Status {
		status: 500,
		message: Some("database is locked".into()),
	});

	let outcome = table.submit_remove(&RecordId::new("s1")).await;
	assert_eq!(outcome.kind, OutcomeKind::MutationFailed);
	assert_eq!(outcome.notice.level, Level::Error);
	assert!(outcome.is_retryable());
	assert!(outcome.notice.message.contains("database is locked"));
	assert_eq!(table.current_rows().await.len(), 2);
}

#[tokio::test]
async fn failed_load_surfaces_notice_and_refresh_recovers() {
	let (transport, table) = seeded();
	transport.fail_next(TransportError::Network("connection refused".into()));

	let view = table.view().await;
	assert_eq!(view.status, FetchStatus::Error);
	assert!(view.rows.is_empty());
	let notice = view.notice.unwrap();
	assert_eq!(notice.level, Level::Error);
	assert!(notice.message.contains("could not load Salaries"));

	table.refresh();
	let view = table.view().await;
	assert_eq!(view.status, FetchStatus::Ready);
	assert!(view.notice.is_none());
	assert_eq!(view.rows.len(), 2);
	assert_eq!(view.title, "Salaries");
}
