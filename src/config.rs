//! GOP cache configuration
//!
//! Grounded on `server/config.rs`'s builder-with-`Default` shape, but much
//! smaller: loading from a config file is out of scope (spec §1), so this
//! is a plain struct, not a `serde`-derived one.

use std::time::Duration;

/// Configuration for the GOP cache (spec §6)
#[derive(Debug, Clone)]
pub struct GopConfig {
    /// Bounds the cache's time span. `Duration::ZERO` disables caching
    /// entirely (spec §4.3 step 1). There is no sensible non-zero default,
    /// so `Default` yields the disabled state.
    pub cache_time: Duration,

    /// Accepted and stored but unused by this core; present for forward
    /// compatibility with modules that do consult it (spec §6).
    pub latency_time: Duration,
}

impl Default for GopConfig {
    fn default() -> Self {
        Self {
            cache_time: Duration::ZERO,
            latency_time: Duration::ZERO,
        }
    }
}

impl GopConfig {
    /// Build a config with caching enabled for the given window.
    pub fn with_cache_time(cache_time: Duration) -> Self {
        Self {
            cache_time,
            ..Default::default()
        }
    }

    pub fn latency_time(mut self, latency_time: Duration) -> Self {
        self.latency_time = latency_time;
        self
    }

    /// Whether caching is enabled at all (spec §4.3 step 1).
    pub fn caching_enabled(&self) -> bool {
        !self.cache_time.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_disables_caching() {
        let config = GopConfig::default();
        assert!(!config.caching_enabled());
        assert_eq!(config.cache_time, Duration::ZERO);
    }

    #[test]
    fn with_cache_time_enables_caching() {
        let config = GopConfig::with_cache_time(Duration::from_millis(2000));
        assert!(config.caching_enabled());
    }

    #[test]
    fn latency_time_is_stored_unused() {
        let config = GopConfig::with_cache_time(Duration::from_millis(1000))
            .latency_time(Duration::from_millis(300));
        assert_eq!(config.latency_time, Duration::from_millis(300));
    }
}
