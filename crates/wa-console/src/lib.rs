//! Line-oriented operator console for the WhatsApp bridge.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod session;
