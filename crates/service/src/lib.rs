//! RFQ Service
//!
//! Core engine: endpoint directory, compliance screening, circuit breakers,
//! quote fan-out and validation, best-quote selection, fade-rate analysis
//! and hard-quote cosigning.

pub mod cache;
pub mod circuit_breaker;
pub mod compliance;
pub mod cosigner;
pub mod dispatcher;
pub mod endpoint_directory;
pub mod fade_rate;
pub mod jobs;
pub mod selector;
pub mod validator;

pub use cache::TtlCache;
pub use circuit_breaker::{CircuitBreaker, FadeRateCircuitBreaker, TimestampCircuitBreaker};
pub use compliance::ComplianceFilter;
pub use cosigner::CosignerService;
pub use dispatcher::QuoteDispatcher;
pub use endpoint_directory::EndpointDirectory;
pub use fade_rate::{calculate_block_until_timestamp, FadeRateUpdater};
pub use jobs::{BackgroundJob, FadeRateJob, IntervalScheduler, JobError};
pub use selector::select_best;
pub use validator::{NormalizedQuote, QuoteValidator};
