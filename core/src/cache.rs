//! On-disk response cache keyed by request URI.
//!
//! # Design
//! One file per URI at `{cache_dir}/easy_rdf_{sha256(uri)}` holding the raw
//! response bytes exactly as received. Freshness comes from the file's
//! modification time alone. Entries are never deleted; a stale one is
//! bypassed and overwritten by the next successful fetch.
//!
//! There is no locking. Two writers for the same URI race at the filesystem
//! level and the last one wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};

use crate::config::Config;

const KEY_PREFIX: &str = "easy_rdf_";

/// File name for the cache entry of `uri`.
pub fn cache_key(uri: &str) -> String {
    format!("{KEY_PREFIX}{}", hex::encode(Sha256::digest(uri.as_bytes())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    dir: PathBuf,
    expire: Duration,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>, expire: Duration) -> Self {
        Self {
            dir: dir.into(),
            expire,
        }
    }

    /// `None` when caching is disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.caching_enabled() {
            return None;
        }
        config
            .cache_dir
            .as_ref()
            .map(|dir| Self::new(dir, config.cache_expire()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, uri: &str) -> PathBuf {
        self.dir.join(cache_key(uri))
    }

    /// The stored bytes for `uri` if an entry exists and its age is within
    /// the freshness window. Any I/O problem counts as a miss.
    pub fn try_read(&self, uri: &str) -> Option<Vec<u8>> {
        let path = self.path_for(uri);
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::debug!(uri, path = %path.display(), error = %e, "cache miss");
                return None;
            }
        };

        // an mtime in the future counts as brand new
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.expire {
            tracing::debug!(uri, age_secs = age.as_secs(), "cache entry stale");
            return None;
        }

        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(uri, bytes = bytes.len(), "cache hit");
                Some(bytes)
            }
            Err(e) => {
                tracing::debug!(uri, error = %e, "cache entry unreadable");
                None
            }
        }
    }

    /// Store `bytes` for `uri`, replacing any previous entry.
    pub fn write(&self, uri: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(uri), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn store(dir: &Path) -> CacheStore {
        CacheStore::new(dir, Duration::from_secs(60))
    }

    #[test]
    fn key_is_deterministic_and_distinct() {
        let a = cache_key("http://example.com/a");
        assert_eq!(a, cache_key("http://example.com/a"));
        assert_ne!(a, cache_key("http://example.com/b"));
        assert!(a.starts_with("easy_rdf_"));
        assert_eq!(a.len(), KEY_PREFIX.len() + 64);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());
        let uri = "http://example.com/foaf.rdf";

        assert!(cache.try_read(uri).is_none());
        cache.write(uri, b"HTTP/1.1 200 OK\r\n\r\nbody").unwrap();
        assert_eq!(
            cache.try_read(uri).as_deref(),
            Some(&b"HTTP/1.1 200 OK\r\n\r\nbody"[..])
        );
        assert!(cache.path_for(uri).starts_with(dir.path()));
    }

    #[test]
    fn overwrite_replaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());
        cache.write("http://a/", b"first").unwrap();
        cache.write("http://a/", b"second").unwrap();
        assert_eq!(cache.try_read("http://a/").as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn stale_entry_is_bypassed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(dir.path());
        let uri = "http://example.com/old";
        cache.write(uri, b"old").unwrap();

        let past = SystemTime::now() - Duration::from_secs(120);
        File::options()
            .write(true)
            .open(cache.path_for(uri))
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert!(cache.try_read(uri).is_none());
        // the file itself is left alone
        assert!(cache.path_for(uri).exists());
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = store(&dir.path().join("nested/cache"));
        cache.write("http://a/", b"x").unwrap();
        assert_eq!(cache.try_read("http://a/").as_deref(), Some(&b"x"[..]));
    }

    #[test]
    fn disabled_without_cache_dir() {
        assert!(CacheStore::from_config(&Config::default()).is_none());

        let mut config = Config::default();
        config.cache_dir = Some(PathBuf::from("/var/cache/rdf"));
        config.cache_expire_seconds = 30;
        let cache = CacheStore::from_config(&config).unwrap();
        assert_eq!(cache.dir(), Path::new("/var/cache/rdf"));

        config.cache_expire_seconds = 0;
        assert!(CacheStore::from_config(&config).is_none());
    }
}
