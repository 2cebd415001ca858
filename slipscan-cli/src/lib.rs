//! slipscan-cli library
//!
//! Relay client and output formatting used by the `slipscan` binary.

pub mod client;
pub mod output;

pub use client::{ClientError, RelayClient};
