//! Builtin dataset catalog.
//!
//! One descriptor per dashboard table. Adding a table is a catalog entry, not
//! new code; deployments that need a different set list them under
//! `[[datasets]]` in the config file instead.

use crate::dataset::{ColumnDescriptor, DatasetDescriptor, DatasetRegistry, ValueKind};
use crate::error::Result;

/// Returns the builtin descriptors in display order.
pub fn builtin() -> Vec<DatasetDescriptor> {
	vec![
		DatasetDescriptor::new("salaries", "Salaries", "/salaries")
			.text("name", "Name")
			.number("amount", "Amount")
			.date("date", "Date"),
		DatasetDescriptor::new("invoices", "Invoices", "/invoices")
			.text("invoice_number", "Invoice #")
			.text("client", "Client")
			.number("amount", "Amount")
			.date("issued_on", "Issued")
			.date("due_on", "Due")
			.status("status", "Status"),
		DatasetDescriptor::new("bonuses", "Bonuses", "/bonuses")
			.text("name", "Name")
			.number("amount", "Amount")
			.text("reason", "Reason")
			.date("date", "Date"),
		DatasetDescriptor::new("transfers", "Transfers", "/transfers")
			.text("from_account", "From")
			.text("to_account", "To")
			.number("amount", "Amount")
			.date("date", "Date")
			.column(ColumnDescriptor::new("reference", "Reference", ValueKind::Text).optional()),
		DatasetDescriptor::new("agent_commissions", "Agent commissions", "/agent-commissions")
			.text("agent", "Agent")
			.number("rate", "Rate %")
			.number("amount", "Amount")
			.date("date", "Date")
			.status("paid", "Paid"),
		DatasetDescriptor::new("expenses", "Expenses", "/expenses")
			.text("category", "Category")
			.text("description", "Description")
			.number("amount", "Amount")
			.date("date", "Date"),
		DatasetDescriptor::new("advances", "Advances", "/advances")
			.text("name", "Name")
			.number("amount", "Amount")
			.date("date", "Date")
			.status("settled", "Settled"),
		DatasetDescriptor::new("deductions", "Deductions", "/deductions")
			.text("name", "Name")
			.number("amount", "Amount")
			.text("reason", "Reason")
			.date("date", "Date"),
	]
}

/// Builds a registry holding [`builtin`].
pub fn builtin_registry() -> Result<DatasetRegistry> {
	DatasetRegistry::from_descriptors(builtin())
}
