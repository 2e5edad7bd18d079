use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use super::DatasetDescriptor;
use crate::error::{Error, Result};

/// Mutable startup phase of a [`DatasetRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
	by_key: IndexMap<String, Arc<DatasetDescriptor>>,
}

impl RegistryBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a descriptor.
	///
	/// # Errors
	///
	/// [`Error::DuplicateResource`] if the key is taken, [`Error::InvalidDescriptor`]
	/// if the descriptor breaks the schema rules.
	pub fn register(&mut self, descriptor: DatasetDescriptor) -> Result<()> {
		descriptor.validate()?;
		if self.by_key.contains_key(&descriptor.key) {
			return Err(Error::DuplicateResource { key: descriptor.key });
		}
		self.by_key.insert(descriptor.key.clone(), Arc::new(descriptor));
		Ok(())
	}

	/// Registers every descriptor, stopping at the first failure.
	pub fn register_all(&mut self, descriptors: impl IntoIterator<Item = DatasetDescriptor>) -> Result<()> {
		descriptors.into_iter().try_for_each(|d| self.register(d))
	}

	/// Freezes the registry.
	pub fn build(self) -> DatasetRegistry {
		info!(datasets = self.by_key.len(), "dataset.registry.frozen");
		DatasetRegistry { by_key: self.by_key }
	}
}

/// Read-only set of dataset descriptors, in registration order.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
	by_key: IndexMap<String, Arc<DatasetDescriptor>>,
}

impl DatasetRegistry {
	/// Starts a registry.
	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::new()
	}

	/// Builds a registry from a complete descriptor list.
	pub fn from_descriptors(descriptors: impl IntoIterator<Item = DatasetDescriptor>) -> Result<Self> {
		let mut builder = RegistryBuilder::new();
		builder.register_all(descriptors)?;
		Ok(builder.build())
	}

	/// Resolves a resource key.
	///
	/// # Errors
	///
	/// [`Error::UnknownResource`] if nothing is registered under `key`.
	pub fn lookup(&self, key: &str) -> Result<Arc<DatasetDescriptor>> {
		self.by_key
			.get(key)
			.cloned()
			.ok_or_else(|| Error::UnknownResource { key: key.to_string() })
	}

	/// Returns true if `key` is registered.
	pub fn contains(&self, key: &str) -> bool {
		self.by_key.contains_key(key)
	}

	/// Iterates descriptors in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
		self.by_key.values().map(|d| &**d)
	}

	/// Number of registered datasets.
	pub fn len(&self) -> usize {
		self.by_key.len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.by_key.is_empty()
	}
}
