//! `tabsync` command line client.
//!
//! Lists and edits the configured datasets over HTTP, using the same engine a
//! dashboard renderer would.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tabsync_engine::{ColumnDescriptor, Engine, EngineConfig, Outcome, ProjectedRow, RecordId, Row, TableController, ValueKind};
use tracing::debug;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "tabsync")]
#[command(about = "List and edit tabular REST datasets")]
struct Args {
	/// Config file (defaults to `$XDG_CONFIG_HOME/tabsync/config.toml` when present)
	#[arg(short, long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Override the server base URL
	#[arg(long, value_name = "URL", global = true)]
	base_url: Option<String>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List configured datasets
	Datasets,
	/// Print the rows of a dataset
	List {
		/// Dataset key
		dataset: String,
	},
	/// Create a record from `field=value` pairs
	Add {
		/// Dataset key
		dataset: String,
		/// Field assignments
		#[arg(value_name = "FIELD=VALUE", value_parser = parse_field)]
		fields: Vec<(String, String)>,
	},
	/// Change fields of an existing record
	Edit {
		/// Dataset key
		dataset: String,
		/// Record id
		id: String,
		/// Field assignments
		#[arg(value_name = "FIELD=VALUE", value_parser = parse_field)]
		fields: Vec<(String, String)>,
	},
	/// Delete a record
	Remove {
		/// Dataset key
		dataset: String,
		/// Record id
		id: String,
	},
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let mut config = load_config(args.config.as_deref())?;
	if let Some(base_url) = args.base_url {
		config.base_url = base_url;
	}
	let engine = Engine::from_config(&config)?;

	match args.command {
		Command::Datasets => {
			for descriptor in engine.registry().iter() {
				println!("{:<20} {:<24} {}", descriptor.key, descriptor.title, descriptor.endpoint);
			}
			Ok(ExitCode::SUCCESS)
		}
		Command::List { dataset } => {
			let table = engine.table(&dataset)?;
			let view = table.view().await;
			print!("{}", render(table.columns(), &view.rows));
			match view.notice {
				Some(notice) => {
					eprintln!("{notice}");
					Ok(ExitCode::FAILURE)
				}
				None => Ok(ExitCode::SUCCESS),
			}
		}
		Command::Add { dataset, fields } => {
			let table = engine.table(&dataset)?;
			let row = typed_row(table.columns(), fields);
			Ok(report(table.submit_add(&row).await))
		}
		Command::Edit { dataset, id, fields } => {
			let table = engine.table(&dataset)?;
			let id = RecordId::new(id);
			let row = merged_row(&table, &id, fields).await?;
			Ok(report(table.submit_edit(&id, &row).await))
		}
		Command::Remove { dataset, id } => {
			let table = engine.table(&dataset)?;
			Ok(report(table.submit_remove(&RecordId::new(id)).await))
		}
	}
}

fn load_config(explicit: Option<&std::path::Path>) -> anyhow::Result<EngineConfig> {
	if let Some(path) = explicit {
		return EngineConfig::load(path).with_context(|| format!("loading {}", path.display()));
	}
	match dirs::config_dir().map(|dir| dir.join("tabsync").join("config.toml")) {
		Some(path) if path.is_file() => EngineConfig::load(&path).with_context(|| format!("loading {}", path.display())),
		_ => {
			debug!("no config file, using defaults");
			Ok(EngineConfig::default())
		}
	}
}

/// Starts from the record's current fields so an edit only names what changes.
async fn merged_row(table: &TableController, id: &RecordId, fields: Vec<(String, String)>) -> anyhow::Result<Row> {
	let rows = table.current_rows().await;
	let Some(current) = rows.iter().find(|r| r.id() == id) else {
		bail!("{}: no record {id}", table.key());
	};
	let mut row = current.to_row();
	row.extend(typed_row(table.columns(), fields));
	Ok(row)
}

fn report(outcome: Outcome) -> ExitCode {
	if outcome.is_success() {
		println!("{}", outcome.notice.message);
		ExitCode::SUCCESS
	} else {
		eprintln!("{}", outcome.notice);
		if outcome.is_retryable() {
			eprintln!("the request can be retried");
		}
		ExitCode::FAILURE
	}
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
	let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))?;
	let key = key.trim();
	if key.is_empty() {
		return Err(format!("empty field name in {raw:?}"));
	}
	Ok((key.to_string(), value.to_string()))
}

/// Reads `true`/`false`/`null` as literals only where the column's kind admits
/// them; text columns and unknown fields keep the raw string.
fn typed_value(kind: Option<ValueKind>, raw: String) -> Value {
	let literal = match (kind, raw.as_str()) {
		(None | Some(ValueKind::Text), _) => None,
		(Some(_), "null") => Some(Value::Null),
		(Some(ValueKind::Status), "true") => Some(Value::Bool(true)),
		(Some(ValueKind::Status), "false") => Some(Value::Bool(false)),
		_ => None,
	};
	literal.unwrap_or(Value::String(raw))
}

fn typed_row(columns: &[ColumnDescriptor], fields: Vec<(String, String)>) -> Row {
	fields
		.into_iter()
		.map(|(key, raw)| {
			let kind = columns.iter().find(|c| c.key == key).map(|c| c.kind);
			(key, typed_value(kind, raw))
		})
		.collect()
}

fn cell(value: Option<&Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(other) => other.to_string(),
	}
}

fn render(columns: &[ColumnDescriptor], rows: &[ProjectedRow]) -> String {
	let mut header = vec!["No".to_string(), "Id".to_string()];
	header.extend(columns.iter().map(|c| c.label.clone()));

	let body: Vec<Vec<String>> = rows
		.iter()
		.map(|row| {
			let mut line = vec![row.no.to_string(), row.id().to_string()];
			line.extend(columns.iter().map(|c| cell(row.get(&c.key))));
			line
		})
		.collect();

	let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
	for line in &body {
		for (width, value) in widths.iter_mut().zip(line) {
			*width = (*width).max(value.chars().count());
		}
	}

	let mut out = String::new();
	for line in std::iter::once(&header).chain(&body) {
		let cells: Vec<String> = line.iter().zip(&widths).map(|(value, &width)| format!("{value:<width$}")).collect();
		out.push_str(cells.join("  ").trim_end());
		out.push('\n');
	}
	out
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("tabsync_engine=debug,tabsync=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
