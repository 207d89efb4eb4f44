//! RFQ Storage
//!
//! In-memory implementations of the engine's collaborator traits. Production
//! deployments bind database, key-value and warehouse backends behind the
//! same traits; these implementations back tests and single-node setups.

pub mod memory_config_store;
pub mod memory_kv_store;
pub mod memory_submitter;
pub mod memory_warehouse;

pub use memory_config_store::MemoryConfigStore;
pub use memory_kv_store::MemoryKvStore;
pub use memory_submitter::{MemoryOrderSubmitter, StaticTransferSimulator};
pub use memory_warehouse::MemoryWarehouse;
