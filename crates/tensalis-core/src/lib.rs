//! # tensalis-core
//!
//! The verification engine of the Tensalis client.
//!
//! This crate provides:
//! - The `Transport` trait, the only seam between the engine and the network
//! - `Verifier`, which validates input and issues single-shot and batch requests
//! - `VerifyStream`, the pull-driven session that re-verifies a response
//!   while it is being generated and stops it at the first block
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tensalis_core::{Verifier, DEFAULT_CHECK_INTERVAL};
//!
//! let verifier = Verifier::new(Box::new(transport));
//! for unit in verifier.verify_stream(llm_chunks, docs, DEFAULT_CHECK_INTERVAL)? {
//!     let unit = unit?;
//!     if unit.is_blocked() {
//!         break;
//!     }
//!     print!("{}", unit.text().unwrap_or_default());
//! }
//! ```

pub mod stream;
pub mod traits;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use stream::{count_tokens, SessionState, VerifyStream};
pub use traits::Transport;
pub use verifier::{Verifier, DEFAULT_CHECK_INTERVAL};
