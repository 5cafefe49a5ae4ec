//! Configuration loading and management.
//!
//! - [`types`]: top-level [`Config`], listener and parent link settings
//! - [`limits`]: protocol and resource limits ([`LimitsConfig`])

mod limits;
mod types;

pub use limits::LimitsConfig;
pub use types::{Config, ConfigError, ParentConfig, ServerConfig};
