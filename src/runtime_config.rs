//! Environment-based runtime configuration.
//!
//! `FLOWGATE_STACK_SIZE` sets the stack size for flow coroutines, in decimal
//! (`16384`) or hex (`0x4000`). Default: 16 KB. Total memory is
//! `stack_size × registered flows`, so tune it to handler depth, not comfort.

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables at registration.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for flow coroutines in bytes (default: 16 KB / 0x4000).
    pub stack_size: usize,
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("FLOWGATE_STACK_SIZE")
            .ok()
            .and_then(|val| parse_stack_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }
}

fn parse_stack_size(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
