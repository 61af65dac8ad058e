pub mod config;
pub mod error;
pub mod job;

pub use config::{ApiConfig, Config, PollingConfig};
pub use error::ApiError;
pub use job::*;
