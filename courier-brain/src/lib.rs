//! HTTP client for the downstream reasoning service.
//!
//! Pure HTTP client: serializes an aggregated turn into the fixed JSON
//! contract, performs a single bounded POST, and classifies the reply.

mod client;
mod error;
mod types;

pub use client::{BrainClient, DEFAULT_REQUEST_TIMEOUT};
pub use error::{BrainError, Result};
pub use types::{BrainOutcome, BrainReply, DEVICE_TYPE, TurnBody, TurnPayload};
