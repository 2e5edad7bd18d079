//! Wiring of registry, cache, executor and transport.

use std::sync::Arc;

use crate::cache::CacheStore;
#[cfg(feature = "http")]
use crate::config::{ConfigError, EngineConfig};
use crate::dataset::DatasetRegistry;
use crate::error::Result;
use crate::mutation::MutationExecutor;
use crate::projector::ProjectedRow;
use crate::table::TableController;
use crate::transport::Transport;

/// One engine instance: a frozen registry plus the cache and executor shared by
/// every table built from it.
#[derive(Clone)]
pub struct Engine {
	registry: Arc<DatasetRegistry>,
	cache: CacheStore,
	executor: MutationExecutor,
}

impl Engine {
	/// Builds an engine over `registry`, talking through `transport`.
	pub fn new(registry: Arc<DatasetRegistry>, transport: Arc<dyn Transport>) -> Self {
		let cache = CacheStore::new(Arc::clone(&registry), Arc::clone(&transport));
		let executor = MutationExecutor::new(transport, cache.clone());
		Self { registry, cache, executor }
	}

	/// Builds an engine with an [`crate::HttpTransport`] from `config`.
	#[cfg(feature = "http")]
	pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
		let registry = Arc::new(config.registry()?);
		let transport = crate::transport::http::HttpTransport::new(&config.base_url, config.timeout())?;
		tracing::info!(base_url = %transport.base_url(), datasets = registry.len(), "engine.ready");
		Ok(Self::new(registry, Arc::new(transport)))
	}

	/// Returns the dataset registry.
	pub fn registry(&self) -> &Arc<DatasetRegistry> {
		&self.registry
	}

	/// Returns the shared cache.
	pub fn cache(&self) -> &CacheStore {
		&self.cache
	}

	/// Returns the shared mutation executor.
	pub fn mutations(&self) -> &MutationExecutor {
		&self.executor
	}

	/// Returns the controller for `key`.
	///
	/// # Errors
	///
	/// [`crate::Error::UnknownResource`] if `key` is not registered.
	pub fn table(&self, key: &str) -> Result<TableController> {
		TableController::new(key, self.cache.clone(), self.executor.clone())
	}

	/// Shorthand for `table(key)?.current_rows()`.
	pub async fn current_rows(&self, key: &str) -> Result<Vec<ProjectedRow>> {
		Ok(self.table(key)?.current_rows().await)
	}
}
