use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// Identifies the entity being polled: a request path plus any query
/// parameters that belong to it. Two keys compare equal only when both
/// the path and the full parameter list match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    path: String,
    params: Vec<(String, String)>,
}

impl ResourceKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

/// Per-run polling configuration. Fixed at `start()`; a resource change
/// reuses the config of the run it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
}

impl PollConfig {
    pub fn from_millis(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from_millis(DEFAULT_INTERVAL_MS)
    }
}

/// The read-only view consumers observe. `loading` is true from a
/// (re)start until the first settled fetch; `error` is empty unless the
/// most recent fetch failed for a reason other than cancellation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: String,
}

impl<T> PollSnapshot<T> {
    pub fn initial() -> Self {
        Self {
            data: None,
            loading: true,
            error: String::new(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl<T> Default for PollSnapshot<T> {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key_display_without_params() {
        let key = ResourceKey::new("/api/pods");
        assert_eq!(key.to_string(), "/api/pods");
    }

    #[test]
    fn test_resource_key_display_with_params() {
        let key = ResourceKey::new("/api/pods")
            .with_param("namespace", "default")
            .with_param("window", "1m");
        assert_eq!(key.to_string(), "/api/pods?namespace=default&window=1m");
    }

    #[test]
    fn test_resource_key_equality_includes_params() {
        let a = ResourceKey::new("/api/pods").with_param("namespace", "default");
        let b = ResourceKey::new("/api/pods").with_param("namespace", "kube-system");
        let c = ResourceKey::new("/api/pods").with_param("namespace", "default");
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_poll_config_default_interval() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot: PollSnapshot<serde_json::Value> = PollSnapshot::initial();
        assert!(snapshot.data.is_none());
        assert!(snapshot.loading);
        assert!(!snapshot.has_error());
    }
}
