//! Best-quote selection

use alloy::primitives::U256;
use tracing::{debug, info};

use rfq_types::{QuoteResponse, TradeType};

use crate::validator::NormalizedQuote;

/// Pick the winning quote from the normalized pool.
///
/// Invalid responses are logged and skipped. For exact-input trades the
/// largest output wins; for exact-output the smallest input. Comparison is
/// strict, so on equal amounts the earlier arrival keeps the win.
pub fn select_best(side: TradeType, candidates: Vec<NormalizedQuote>) -> Option<QuoteResponse> {
	let mut best: Option<QuoteResponse> = None;

	for candidate in candidates {
		if !candidate.is_valid() {
			debug!(
				filler = %candidate.response.endpoint.filler_name,
				errors = ?candidate.errors,
				"dropping invalid quote"
			);
			continue;
		}

		let response = candidate.response;
		debug!(
			filler = %candidate_label(&response),
			amount = %response.quoted_amount(side),
			"quote candidate"
		);

		best = match best {
			None => Some(response),
			Some(current) => {
				if beats(side, response.quoted_amount(side), current.quoted_amount(side)) {
					Some(response)
				} else {
					Some(current)
				}
			},
		};
	}

	if let Some(winner) = &best {
		info!(
			request_id = %winner.request_id,
			quote_id = %winner.quote_id,
			filler = %candidate_label(winner),
			amount_in = %winner.amount_in,
			amount_out = %winner.amount_out,
			"selected best quote"
		);
	}
	best
}

fn beats(side: TradeType, challenger: U256, incumbent: U256) -> bool {
	match side {
		TradeType::ExactInput => challenger > incumbent,
		TradeType::ExactOutput => challenger < incumbent,
	}
}

fn candidate_label(response: &QuoteResponse) -> &str {
	if response.endpoint.filler_name.is_empty() {
		"unknown"
	} else {
		&response.endpoint.filler_name
	}
}
