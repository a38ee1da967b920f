//! # tensalis-client
//!
//! HTTP plumbing for the Tensalis client: configuration loading, a blocking
//! `reqwest` exchange, the retry policy, and the `TensalisClient` facade.
//!
//! ## Layers
//!
//! ```text
//! TensalisClient ─▶ Verifier (tensalis-core)
//!                      └─▶ RetryingTransport ─▶ Exchange (ReqwestExchange)
//!                                  └─▶ Sleeper (ThreadSleeper)
//! ```
//!
//! `Exchange` and `Sleeper` are traits so the retry policy can be exercised
//! without a network or a wall clock.

pub mod client;
pub mod config;
pub mod exchange;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use client::TensalisClient;
pub use config::ClientConfig;
pub use exchange::{AttemptFailure, Exchange, RawResponse, ReqwestExchange};
pub use retry::{RetryingTransport, Sleeper, ThreadSleeper};
