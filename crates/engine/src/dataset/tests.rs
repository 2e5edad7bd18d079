use serde_json::json;

use super::*;

fn salaries() -> DatasetDescriptor {
	DatasetDescriptor::new("salaries", "Salaries", "/salaries")
		.text("name", "Name")
		.number("amount", "Amount")
		.date("date", "Date")
}

#[test]
fn register_then_lookup() {
	let registry = DatasetRegistry::from_descriptors([salaries()]).unwrap();
	let descriptor = registry.lookup("salaries").unwrap();
	assert_eq!(descriptor.endpoint, "/salaries");
	assert_eq!(descriptor.columns.len(), 3);
}

#[test]
fn duplicate_key_is_rejected() {
	let mut builder = RegistryBuilder::new();
	builder.register(salaries()).unwrap();
	let err = builder.register(salaries()).unwrap_err();
	assert_eq!(err, Error::DuplicateResource { key: "salaries".into() });
	assert!(err.is_fatal());
}

#[test]
fn unknown_key_is_reported() {
	let registry = DatasetRegistry::from_descriptors([salaries()]).unwrap();
	let err = registry.lookup("bonuses").unwrap_err();
	assert_eq!(err, Error::UnknownResource { key: "bonuses".into() });
}

#[test]
fn registration_order_is_kept() {
	let registry = DatasetRegistry::from_descriptors([
		DatasetDescriptor::new("b", "B", "/b").text("x", "X"),
		DatasetDescriptor::new("a", "A", "/a").text("x", "X"),
	])
	.unwrap();
	let keys: Vec<_> = registry.iter().map(|d| d.key.as_str()).collect();
	assert_eq!(keys, ["b", "a"]);
}

#[test]
fn reserved_and_duplicate_columns_are_rejected() {
	let shadowing = DatasetDescriptor::new("t", "T", "/t").text("no", "No");
	assert!(matches!(shadowing.validate(), Err(Error::InvalidDescriptor { .. })));

	let duplicated = DatasetDescriptor::new("t", "T", "/t").text("a", "A").number("a", "A2");
	assert!(matches!(duplicated.validate(), Err(Error::InvalidDescriptor { .. })));

	let empty = DatasetDescriptor::new("t", "T", "");
	assert!(matches!(empty.validate(), Err(Error::InvalidDescriptor { .. })));
}

#[test]
fn number_kind_accepts_form_strings() {
	assert_eq!(ValueKind::Number.normalize(json!("100")), Ok(json!(100)));
	assert_eq!(ValueKind::Number.normalize(json!(" 2.5 ")), Ok(json!(2.5)));
	assert_eq!(ValueKind::Number.normalize(json!("")), Ok(json!(null)));
	assert!(ValueKind::Number.normalize(json!("ten")).is_err());
	assert!(ValueKind::Number.normalize(json!(true)).is_err());
}

#[test]
fn kinds_reject_nested_values() {
	for kind in [ValueKind::Text, ValueKind::Number, ValueKind::Date, ValueKind::Status] {
		assert!(kind.normalize(json!([1])).is_err(), "{kind:?}");
		assert!(kind.normalize(json!({"a": 1})).is_err(), "{kind:?}");
	}
}

#[test]
fn status_accepts_labels_and_flags() {
	assert_eq!(ValueKind::Status.normalize(json!("paid")), Ok(json!("paid")));
	assert_eq!(ValueKind::Status.normalize(json!(false)), Ok(json!(false)));
	assert!(ValueKind::Status.normalize(json!(3)).is_err());
}

#[test]
fn descriptor_deserializes_with_defaults() {
	let descriptor: DatasetDescriptor = serde_json::from_value(json!({
		"key": "bonuses",
		"title": "Bonuses",
		"endpoint": "/bonuses",
		"columns": [
			{"key": "name", "label": "Name"},
			{"key": "amount", "label": "Amount", "kind": "number", "required": false},
		],
	}))
	.unwrap();
	assert_eq!(descriptor.update_id, UpdateIdPolicy::Keep);
	assert_eq!(descriptor.columns[0].kind, ValueKind::Text);
	assert!(descriptor.columns[0].required);
	assert!(!descriptor.columns[1].required);
}
