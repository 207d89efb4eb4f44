//! RFQ Webhook
//!
//! Outbound HTTP plumbing for filler webhooks: pooled client cache and the
//! single-call quote client with outcome classification.

pub mod client;
pub mod client_cache;

pub use client::{NonQuoteReason, WebhookClient, WebhookError, WebhookOutcome};
pub use client_cache::{global_client_cache, ClientCache, ClientConfig};
