//! Command handlers module.
//!
//! - `core.rs`: conversation and state commands (chat, ask, mode, status)
//! - `config.rs`: configuration display command

mod config;
mod core;

pub use self::config::cmd_config;
pub use self::core::{cmd_ask, cmd_chat, cmd_mode, cmd_status};
