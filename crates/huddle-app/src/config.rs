//! Application configuration.

/// Default capacity of the stream channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Allow opening a room with oneself.
    pub allow_self_chat: bool,
    /// Capacity of the stream channel between adapter and runtime.
    pub channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { allow_self_chat: false, channel_capacity: DEFAULT_CHANNEL_CAPACITY }
    }
}
