//! AWS adapters
//!
//! - [`StsCredentialBroker`]: role assumption for every inspection attempt
//! - [`AwsInventoryBackend`]: read-only inventory, metrics and spend calls
//! - [`session`]: SDK configuration with SDK-level retries disabled

pub mod credentials;
pub mod fault;
pub mod inventory;
pub mod session;

pub use credentials::StsCredentialBroker;
pub use fault::remote_fault;
pub use inventory::AwsInventoryBackend;
pub use session::{base_config, scoped_config};
