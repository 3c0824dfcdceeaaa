//! bank-core: Shared infrastructure for the banking backend crates.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use anyhow;
pub use mongodb;
pub use serde;
pub use tokio;
pub use tracing;
pub use validator;
