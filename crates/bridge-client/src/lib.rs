//! WhatsApp bridge REST API client.

mod client;
mod error;
mod types;

pub use client::{BridgeClient, DEVICE_HEADER};
pub use error::BridgeError;
pub use types::*;
