pub mod auth;
pub mod client;
pub mod models;
pub mod retry;

pub use client::{ApiConfig, VbrickClient};
pub use retry::{FailureClass, RetryConfig, RetryDecision, RetryPolicy};
