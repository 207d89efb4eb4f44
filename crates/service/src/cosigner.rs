//! Hard-quote cosigning and submission

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use chrono::Utc;
use tracing::{debug, info};

use rfq_types::orders::EXCLUSIVITY_OVERRIDE_BPS;
use rfq_types::{
	CosignedOrder, CosignerData, HardQuoteError, HardQuoteRequest, QuoteResponse, SecretString,
	SubmissionReceipt, TradeType,
};

/// Decay starts one quote-validity period after cosigning so the winning
/// filler has time to land the fill at the quoted price. Mainnet gets a
/// wider window to cover its slower blocks: start two blocks out, decay
/// over five.
fn decay_window(chain_id: u64, now: u64) -> (u64, u64) {
	let (lead, length) = if chain_id == 1 { (24, 60) } else { (10, 30) };
	let start = now + lead;
	(start, start + length)
}

/// Signs winning quotes into orders and hands them to the settlement
/// pipeline. Holds the cosigner key for the lifetime of the process.
pub struct CosignerService {
	signer: PrivateKeySigner,
	submitter: Arc<dyn rfq_types::OrderSubmitter>,
}

impl CosignerService {
	pub fn new(signer: PrivateKeySigner, submitter: Arc<dyn rfq_types::OrderSubmitter>) -> Self {
		Self { signer, submitter }
	}

	pub fn from_key(
		key: &SecretString,
		submitter: Arc<dyn rfq_types::OrderSubmitter>,
	) -> Result<Self, HardQuoteError> {
		let signer = PrivateKeySigner::from_str(key.expose_secret())
			.map_err(|err| HardQuoteError::Signing(err.to_string()))?;
		Ok(Self::new(signer, submitter))
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Derive the cosigner data for this order from the best quote, if any.
	///
	/// A quote only earns exclusivity when it names a filler and strictly
	/// improves on the order's own terms; otherwise the order goes out open,
	/// and only when the caller opted into that.
	pub fn build_cosigner_data(
		&self,
		request: &HardQuoteRequest,
		best: Option<&QuoteResponse>,
		now: u64,
	) -> Result<CosignerData, HardQuoteError> {
		let (decay_start_time, decay_end_time) = decay_window(request.chain_id, now);
		let num_outputs = request.order.outputs.len();

		if let Some(best) = best {
			if let Some(filler) = best.filler {
				if let Some(improvement) = self.improvement(request, best) {
					let mut data = CosignerData::open(decay_start_time, decay_end_time, num_outputs);
					data.exclusive_filler = filler;
					data.exclusivity_override_bps = U256::from(EXCLUSIVITY_OVERRIDE_BPS);
					match request.side {
						TradeType::ExactInput => data.output_overrides[0] = improvement,
						TradeType::ExactOutput => data.input_override = improvement,
					}
					debug!(
						filler = %filler,
						improvement = %improvement,
						"granting exclusivity to winning filler"
					);
					return Ok(data);
				}
			}
		}

		if request.allow_no_quote {
			debug!(request_id = %request.request_id, "issuing open order");
			return Ok(CosignerData::open(decay_start_time, decay_end_time, num_outputs));
		}
		Err(HardQuoteError::NoQuote {
			request_id: request.request_id,
		})
	}

	/// The winning amount when it strictly beats the order's own terms
	fn improvement(&self, request: &HardQuoteRequest, best: &QuoteResponse) -> Option<U256> {
		match request.side {
			TradeType::ExactInput => {
				let floor = request.order.outputs.first()?.amount;
				(best.amount_out > floor).then_some(best.amount_out)
			},
			TradeType::ExactOutput => {
				let ceiling = request.order.input.amount;
				(best.amount_in < ceiling).then_some(best.amount_in)
			},
		}
	}

	/// Full hard-quote tail: verify the cosigner, decorate, sign and submit
	pub async fn cosign_and_submit(
		&self,
		request: &HardQuoteRequest,
		best: Option<&QuoteResponse>,
	) -> Result<(CosignedOrder, SubmissionReceipt), HardQuoteError> {
		if request.order.cosigner != self.address() {
			return Err(HardQuoteError::UnknownCosigner {
				expected: self.address(),
				got: request.order.cosigner,
			});
		}

		let now = Utc::now().timestamp() as u64;
		let cosigner_data = self.build_cosigner_data(request, best, now)?;

		let digest = cosigner_data.digest(request.order.struct_hash(), request.chain_id);
		let signature = self
			.signer
			.sign_hash_sync(&digest)
			.map_err(|err| HardQuoteError::Signing(err.to_string()))?;

		let order = CosignedOrder {
			quote_id: request
				.quote_id
				.or(best.map(|b| b.quote_id))
				.unwrap_or_else(uuid::Uuid::new_v4),
			chain_id: request.chain_id,
			order: request.order.clone(),
			cosigner_data,
			cosignature: Bytes::from(signature.as_bytes().to_vec()),
			user_signature: request.user_signature.clone(),
		};

		let receipt = self.submitter.submit(&order).await?;
		if !receipt.is_success() {
			return Err(HardQuoteError::Submission {
				status: receipt.status_code,
				message: receipt.message,
			});
		}

		info!(
			request_id = %request.request_id,
			quote_id = %order.quote_id,
			chain_id = order.chain_id,
			"cosigned order submitted"
		);
		Ok((order, receipt))
	}
}
