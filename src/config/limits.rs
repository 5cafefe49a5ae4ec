//! Protocol and resource limits configuration.

use serde::Deserialize;

/// Protocol and resource limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest accepted line in bytes, excluding the terminator (default: 2048).
    pub max_line_len: usize,
    /// Frames queued per route before the route is dropped (default: 1024).
    pub max_outbound_queue: usize,
    /// Longest nickname the root grants (default: 16).
    pub max_nick_len: usize,
    /// Longest channel name (default: 13).
    pub max_channel_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_len: ibrc_proto::DEFAULT_MAX_LINE_LEN,
            max_outbound_queue: 1024,
            max_nick_len: 16,
            max_channel_len: 13,
        }
    }
}
