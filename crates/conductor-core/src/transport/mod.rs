//! Resilient Transport: HTTP with a per-call timeout and bounded retries.
//!
//! ```text
//! provider adapter ──► ResilientTransport ──► RetryPolicy (when / how long)
//!                              │
//!                           HttpSend (reqwest in production, stubs in tests)
//! ```

pub mod client;
pub mod request;
pub mod retry;

pub use client::{ReqwestSender, ResilientTransport};
pub use request::{HttpRequest, HttpResponse, HttpSend};
pub use retry::{Backoff, RetryPolicy};
