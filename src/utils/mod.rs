pub mod logging;
pub mod progress;
pub mod retry;

pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
