//! Client configuration.
//!
//! # Design
//! `Config::default()` holds the hard-coded defaults; a client owns its own
//! copy and nothing is process-wide. `merge` overlays a JSON object onto the
//! current values by round-tripping through serde, so a key that is not
//! supplied keeps its value and a key nobody recognizes lands in `extra`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_REDIRECTS: u32 = 5;
pub const DEFAULT_USER_AGENT: &str = concat!("easyhttp-core/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_CACHE_EXPIRE_SECONDS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Redirect hops to follow before returning the last response as-is.
    pub max_redirects: u32,
    /// Sent as `User-Agent` unless the caller set that header.
    pub user_agent: String,
    /// Connect, read, and write timeout. 0 means no timeout.
    pub timeout_seconds: u64,
    /// Caching is enabled when this is set and `cache_expire_seconds` is
    /// non-zero.
    pub cache_dir: Option<PathBuf>,
    /// Freshness window for cache entries, measured against file mtime.
    /// 0 turns caching off.
    pub cache_expire_seconds: u64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            cache_dir: None,
            cache_expire_seconds: DEFAULT_CACHE_EXPIRE_SECONDS,
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Overwrite the keys present in `options`, which must be a JSON object.
    ///
    /// Keys are lowercased first. `maxredirects`, `useragent`, `timeout` and
    /// `cache_expire` are accepted for their underscored counterparts. On
    /// error `self` is left unchanged.
    pub fn merge(&mut self, options: Value) -> Result<()> {
        let options = match options {
            Value::Object(options) => options,
            other => {
                return Err(Error::InvalidConfiguration(format!(
                    "expected a key/value mapping, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut merged = match serde_json::to_value(&*self) {
            Ok(Value::Object(current)) => current,
            Ok(_) => Map::new(),
            Err(e) => return Err(Error::InvalidConfiguration(e.to_string())),
        };
        for (key, value) in options {
            let key = key.to_lowercase();
            merged.insert(canonical_key(&key).to_string(), value);
        }

        *self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        Ok(())
    }

    /// A stored option that is not one of the recognized keys.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(&key.to_lowercase())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    pub fn cache_expire(&self) -> Duration {
        Duration::from_secs(self.cache_expire_seconds)
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache_dir.is_some() && self.cache_expire_seconds > 0
    }
}

fn canonical_key(key: &str) -> &str {
    match key {
        "maxredirects" => "max_redirects",
        "useragent" => "user_agent",
        "timeout" => "timeout_seconds",
        "cache_expire" => "cache_expire_seconds",
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.cache_expire_seconds, 3600);
        assert!(config.cache_dir.is_none());
        assert!(!config.caching_enabled());
        assert!(config.user_agent.starts_with("easyhttp-core/"));
    }

    #[test]
    fn merge_overwrites_only_supplied_keys() {
        let mut config = Config::default();
        config
            .merge(json!({"MAX_REDIRECTS": 2, "cache_dir": "/tmp/rdf"}))
            .unwrap();
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/rdf")));
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);

        config.merge(json!({"timeout_seconds": 3})).unwrap();
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn legacy_key_spellings_are_aliases() {
        let mut config = Config::default();
        config
            .merge(json!({"MaxRedirects": 1, "UserAgent": "rdf-bot", "timeout": 7, "cache_expire": 60}))
            .unwrap();
        assert_eq!(config.max_redirects, 1);
        assert_eq!(config.user_agent, "rdf-bot");
        assert_eq!(config.timeout_seconds, 7);
        assert_eq!(config.cache_expire(), Duration::from_secs(60));
        assert!(config.extra("maxredirects").is_none());
    }

    #[test]
    fn unknown_keys_are_kept() {
        let mut config = Config::default();
        config.merge(json!({"Proxy": "http://proxy:3128"})).unwrap();
        assert_eq!(config.extra("proxy"), Some(&json!("http://proxy:3128")));

        // survives a later merge
        config.merge(json!({"max_redirects": 0})).unwrap();
        assert_eq!(config.extra("PROXY"), Some(&json!("http://proxy:3128")));
    }

    #[test]
    fn null_cache_dir_disables_caching() {
        let mut config = Config::default();
        config.merge(json!({"cache_dir": "/tmp/x"})).unwrap();
        assert!(config.caching_enabled());
        config.merge(json!({"cache_dir": null})).unwrap();
        assert!(!config.caching_enabled());
    }

    #[test]
    fn zero_expiry_disables_caching() {
        let mut config = Config::default();
        config
            .merge(json!({"cache_dir": "/tmp/x", "cache_expire": 0}))
            .unwrap();
        assert!(!config.caching_enabled());
    }

    #[test]
    fn zero_timeout_means_none() {
        let mut config = Config::default();
        config.merge(json!({"timeout_seconds": 0})).unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn non_mapping_is_rejected() {
        let mut config = Config::default();
        for bad in [json!(null), json!(5), json!("max_redirects"), json!([1, 2])] {
            let err = config.merge(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)));
        }
        assert_eq!(config, Config::default());
    }

    #[test]
    fn wrong_type_is_rejected_without_partial_update() {
        let mut config = Config::default();
        let err = config
            .merge(json!({"user_agent": "x", "max_redirects": "lots"}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert_eq!(config, Config::default());
    }
}
