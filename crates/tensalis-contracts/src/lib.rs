//! # tensalis-contracts
//!
//! Shared types, wire payloads, and error contracts for the Tensalis client.
//!
//! Every crate in the workspace imports from here. No I/O lives in this
//! crate — only data definitions, their decoding rules, and error types.

pub mod context;
pub mod error;
pub mod request;
pub mod stream;
pub mod verdict;

pub use context::Context;
pub use error::{TensalisError, TensalisResult};
pub use request::{BatchItem, Method, Mode};
pub use stream::{StreamUnit, UnitStatus};
pub use verdict::{Severity, Verdict, VerdictStatus};
