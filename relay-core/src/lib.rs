pub mod config;
pub mod error;
pub mod generator;
pub mod migrations;
pub mod notifier;
pub mod observability;
pub mod orchestrator;
pub mod publisher;
pub mod resilience;
pub mod security;
pub mod server;
pub mod storage;
pub mod submission;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use orchestrator::Orchestrator;
pub use storage::RecordStore;
