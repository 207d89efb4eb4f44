//! Quote request/response domain models

pub mod errors;
pub mod request;
pub mod response;

pub use errors::{QuoteError, QuoteValidationError};
pub use request::{ProtocolVersion, QuoteRequest, TradeType, WireQuoteRequest, SUPPORTED_CHAIN_IDS};
pub use response::{EndpointMetadata, QuoteResponse};

/// Result type for quote operations
pub type QuoteResult<T> = Result<T, QuoteError>;
