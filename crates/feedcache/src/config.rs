use std::{env, str::FromStr, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cache TTL in seconds (default: 300)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Bound on a single cache call in milliseconds (default: 250)
    pub cache_timeout_ms: u64,
    /// Bound on a single store call in milliseconds (default: 5,000)
    pub store_timeout_ms: u64,
    /// Number of posts returned by `GET /posts` without `limit` (default: 50)
    pub feed_limit: u32,
    /// Path to SQLite database file (default: "feedcache.db")
    /// Note: Only used when the `sqlite` feature is enabled.
    #[allow(dead_code)]
    pub sqlite_path: String,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
    /// Allowed CORS origin, `*` for any (default: "*")
    pub frontend_url: String,
    /// Requests allowed per client and window (default: 100)
    pub rate_limit_max: u32,
    /// Rate limit window in seconds (default: 60)
    pub rate_limit_window_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `CACHE_TIMEOUT_MS` - Cache call timeout (default: 250)
    /// - `STORE_TIMEOUT_MS` - Store call timeout (default: 5,000)
    /// - `FEED_LIMIT` - Default feed size (default: 50)
    /// - `SQLITE_PATH` - SQLite database path (default: "feedcache.db")
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `FRONTEND_URL` - Allowed CORS origin (default: "*")
    /// - `RATE_LIMIT_MAX` - Requests per window and client (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECONDS` - Rate limit window (default: 60)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            cache_ttl_seconds: parse_or(&lookup, "CACHE_TTL_SECONDS", 300),
            cache_max_entries: parse_or(&lookup, "CACHE_MAX_ENTRIES", 10_000),
            cache_timeout_ms: parse_or(&lookup, "CACHE_TIMEOUT_MS", 250),
            store_timeout_ms: parse_or(&lookup, "STORE_TIMEOUT_MS", 5_000),
            feed_limit: parse_or(&lookup, "FEED_LIMIT", 50),
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "feedcache.db".to_string()),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            frontend_url: lookup("FRONTEND_URL").unwrap_or_else(|| "*".to_string()),
            rate_limit_max: parse_or(&lookup, "RATE_LIMIT_MAX", 100),
            rate_limit_window_seconds: parse_or(&lookup, "RATE_LIMIT_WINDOW_SECONDS", 60),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds.max(1))
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.cache_timeout_ms, 250);
        assert_eq!(config.store_timeout_ms, 5_000);
        assert_eq!(config.feed_limit, 50);
        assert_eq!(config.sqlite_path, "feedcache.db");
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.frontend_url, "*");
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window_seconds, 60);
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("CACHE_TTL_SECONDS", "600"),
            ("STORE_TIMEOUT_MS", " 1500 "),
            ("FRONTEND_URL", "https://app.example.com"),
            ("RATE_LIMIT_MAX", "5"),
        ]);

        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.store_timeout(), Duration::from_millis(1_500));
        assert_eq!(config.frontend_url, "https://app.example.com");
        assert_eq!(config.rate_limit_max, 5);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = from_map(&[("CACHE_TTL_SECONDS", "five"), ("FEED_LIMIT", "-1")]);

        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.feed_limit, 50);
    }

    #[test]
    fn test_zero_rate_limit_window_is_raised() {
        let config = from_map(&[("RATE_LIMIT_WINDOW_SECONDS", "0")]);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(1));
    }
}
