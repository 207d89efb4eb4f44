//! Order submitter and transfer simulator fakes

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use alloy::primitives::{Address, U256};
use rfq_types::{
	CosignedOrder, OrderSubmitter, SimulationError, StorageError, StorageResult, SubmissionReceipt,
	TransferSimulator,
};

/// Records every submitted order; optionally answers with a failure status
#[derive(Clone, Default)]
pub struct MemoryOrderSubmitter {
	submitted: Arc<RwLock<Vec<CosignedOrder>>>,
	failure_status: Option<u16>,
}

impl MemoryOrderSubmitter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_with(status: u16) -> Self {
		Self {
			submitted: Arc::new(RwLock::new(Vec::new())),
			failure_status: Some(status),
		}
	}

	pub fn submitted_orders(&self) -> Vec<CosignedOrder> {
		self.submitted
			.read()
			.map(|guard| guard.clone())
			.unwrap_or_default()
	}
}

#[async_trait]
impl OrderSubmitter for MemoryOrderSubmitter {
	async fn submit(&self, order: &CosignedOrder) -> StorageResult<SubmissionReceipt> {
		self.submitted
			.write()
			.map(|mut guard| guard.push(order.clone()))
			.map_err(|_| StorageError::Backend("submitted lock poisoned".to_string()))?;

		Ok(match self.failure_status {
			Some(status) => SubmissionReceipt {
				status_code: status,
				message: Some("submission rejected".to_string()),
			},
			None => SubmissionReceipt {
				status_code: 201,
				message: None,
			},
		})
	}
}

/// Transfer simulator answering from a fixed deny-set of tokens
#[derive(Clone, Default)]
pub struct StaticTransferSimulator {
	denied_tokens: Arc<HashSet<Address>>,
	unavailable: bool,
}

impl StaticTransferSimulator {
	/// Allows every transfer
	pub fn permissive() -> Self {
		Self::default()
	}

	pub fn denying(tokens: impl IntoIterator<Item = Address>) -> Self {
		Self {
			denied_tokens: Arc::new(tokens.into_iter().collect()),
			unavailable: false,
		}
	}

	/// Every call errors, for exercising fail-open behavior
	pub fn unavailable() -> Self {
		Self {
			denied_tokens: Arc::new(HashSet::new()),
			unavailable: true,
		}
	}
}

#[async_trait]
impl TransferSimulator for StaticTransferSimulator {
	async fn can_transfer(
		&self,
		token: Address,
		_from: Address,
		_to: Address,
		_amount: U256,
	) -> Result<bool, SimulationError> {
		if self.unavailable {
			return Err(SimulationError::Unavailable(
				"simulator offline".to_string(),
			));
		}
		Ok(!self.denied_tokens.contains(&token))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;
	use rfq_types::{CosignerData, OrderInput, OrderOutput, UnsignedOrder};
	use uuid::Uuid;

	fn order() -> CosignedOrder {
		CosignedOrder {
			quote_id: Uuid::new_v4(),
			chain_id: 1,
			order: UnsignedOrder {
				reactor: Address::ZERO,
				swapper: Address::ZERO,
				cosigner: Address::ZERO,
				input: OrderInput {
					token: Address::ZERO,
					amount: U256::ZERO,
				},
				outputs: vec![OrderOutput {
					token: Address::ZERO,
					amount: U256::ZERO,
					recipient: Address::ZERO,
				}],
			},
			cosigner_data: CosignerData::open(0, 0, 1),
			cosignature: Default::default(),
			user_signature: Default::default(),
		}
	}

	#[tokio::test]
	async fn records_submissions() {
		let submitter = MemoryOrderSubmitter::new();
		let receipt = submitter.submit(&order()).await.unwrap();

		assert!(receipt.is_success());
		assert_eq!(submitter.submitted_orders().len(), 1);
	}

	#[tokio::test]
	async fn failing_submitter_reports_status() {
		let submitter = MemoryOrderSubmitter::failing_with(503);
		let receipt = submitter.submit(&order()).await.unwrap();
		assert_eq!(receipt.status_code, 503);
		assert!(!receipt.is_success());
	}

	#[tokio::test]
	async fn simulator_denies_listed_tokens() {
		let usdt = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
		let simulator = StaticTransferSimulator::denying([usdt]);

		let denied = simulator
			.can_transfer(usdt, Address::ZERO, Address::ZERO, U256::from(1u64))
			.await
			.unwrap();
		let allowed = simulator
			.can_transfer(Address::ZERO, Address::ZERO, Address::ZERO, U256::from(1u64))
			.await
			.unwrap();

		assert!(!denied);
		assert!(allowed);
	}
}
