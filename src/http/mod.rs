//! HTTP client module with retry logic and error handling.
//!
//! Both remote collaborators (the release manifest API and the upstream
//! simple index) go through [`HttpClient`]; retry policy lives here and never
//! in the index assembly code.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable, classify_error};
