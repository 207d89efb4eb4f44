//! In-memory analytics warehouse fake

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use rfq_types::{OrderOutcomeRow, QueryStatus, StorageError, StorageResult, Warehouse};

/// Warehouse fake that mimics asynchronous query execution: a submitted
/// query reports `Started` for a configurable number of polls before turning
/// terminal. Rows are filtered by the submitted `since_timestamp`.
#[derive(Clone)]
pub struct MemoryWarehouse {
	rows: Arc<RwLock<Vec<OrderOutcomeRow>>>,
	executions: Arc<DashMap<String, Execution>>,
	next_id: Arc<AtomicU64>,
	polls_until_finished: u32,
	fail_queries: bool,
}

#[derive(Clone)]
struct Execution {
	since_timestamp: i64,
	polls_seen: u32,
}

impl MemoryWarehouse {
	pub fn new(rows: Vec<OrderOutcomeRow>) -> Self {
		Self {
			rows: Arc::new(RwLock::new(rows)),
			executions: Arc::new(DashMap::new()),
			next_id: Arc::new(AtomicU64::new(1)),
			polls_until_finished: 1,
			fail_queries: false,
		}
	}

	/// Queries report `Started` for this many polls before finishing
	pub fn with_polls_until_finished(mut self, polls: u32) -> Self {
		self.polls_until_finished = polls;
		self
	}

	/// Every query ends in `Failed`
	pub fn with_failing_queries(mut self) -> Self {
		self.fail_queries = true;
		self
	}

	pub fn push_row(&self, row: OrderOutcomeRow) {
		if let Ok(mut guard) = self.rows.write() {
			guard.push(row);
		}
	}
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
	async fn submit_query(&self, since_timestamp: i64) -> StorageResult<String> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let execution_id = format!("exec-{id}");
		self.executions.insert(
			execution_id.clone(),
			Execution {
				since_timestamp,
				polls_seen: 0,
			},
		);
		Ok(execution_id)
	}

	async fn query_status(&self, execution_id: &str) -> StorageResult<QueryStatus> {
		let mut execution = self
			.executions
			.get_mut(execution_id)
			.ok_or_else(|| StorageError::NotFound(format!("execution {execution_id}")))?;

		execution.polls_seen += 1;
		if execution.polls_seen <= self.polls_until_finished {
			return Ok(QueryStatus::Started);
		}
		Ok(if self.fail_queries {
			QueryStatus::Failed
		} else {
			QueryStatus::Finished
		})
	}

	async fn fetch_rows(&self, execution_id: &str) -> StorageResult<Vec<OrderOutcomeRow>> {
		let since = self
			.executions
			.get(execution_id)
			.map(|e| e.since_timestamp)
			.ok_or_else(|| StorageError::NotFound(format!("execution {execution_id}")))?;

		self.rows
			.read()
			.map(|guard| {
				guard
					.iter()
					.filter(|row| row.post_timestamp > since)
					.cloned()
					.collect()
			})
			.map_err(|_| StorageError::Backend("rows lock poisoned".to_string()))
	}
}
