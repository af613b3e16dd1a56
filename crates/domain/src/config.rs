//! Dispatcher configuration.

/// Default number of attempts the retry decorator makes.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Options for the reference handler composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum attempts per command on transient storage failures (at least 1).
    pub max_retries: u32,
}

impl DispatcherConfig {
    /// Creates a config; zero falls back to [`DEFAULT_MAX_RETRIES`].
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: if max_retries == 0 {
                DEFAULT_MAX_RETRIES
            } else {
                max_retries
            },
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
