//! In-memory key-value store for filler timestamp state

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use rfq_types::{FillerTimestampRow, KeyValueStore, StorageResult};

/// DashMap-backed stand-in for the low-latency production store
#[derive(Clone, Default)]
pub struct MemoryKvStore {
	rows: Arc<DashMap<String, FillerTimestampRow>>,
	directory: Arc<DashMap<Address, String>>,
}

impl MemoryKvStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_row(&self, row: FillerTimestampRow) {
		self.rows.insert(row.hash.clone(), row);
	}

	pub fn register_filler(&self, address: Address, name: impl Into<String>) {
		self.directory.insert(address, name.into());
	}
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
	async fn get_timestamp_row(&self, hash: &str) -> StorageResult<Option<FillerTimestampRow>> {
		Ok(self.rows.get(hash).map(|entry| entry.value().clone()))
	}

	async fn batch_get_timestamp_rows(
		&self,
		hashes: &[String],
	) -> StorageResult<HashMap<String, FillerTimestampRow>> {
		Ok(hashes
			.iter()
			.filter_map(|hash| {
				self.rows
					.get(hash)
					.map(|entry| (hash.clone(), entry.value().clone()))
			})
			.collect())
	}

	async fn batch_put_timestamp_rows(&self, rows: Vec<FillerTimestampRow>) -> StorageResult<()> {
		for row in rows {
			self.rows.insert(row.hash.clone(), row);
		}
		Ok(())
	}

	async fn filler_directory(&self) -> StorageResult<HashMap<Address, String>> {
		Ok(self
			.directory
			.iter()
			.map(|entry| (*entry.key(), entry.value().clone()))
			.collect())
	}
}
