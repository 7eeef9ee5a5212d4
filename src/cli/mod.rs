pub mod fetch;
pub mod watch;

use crate::core::models::ResourceKey;
use anyhow::{Context, Result};

/// Build a resource key from repeated `--param name=value` flags. The
/// polled path is the URL itself, so the key carries parameters only.
pub(crate) fn parse_params(params: &[String]) -> Result<ResourceKey> {
    let mut key = ResourceKey::new("");
    for param in params {
        let (name, value) = param
            .split_once('=')
            .with_context(|| format!("Invalid --param '{param}', expected name=value"))?;
        key = key.with_param(name, value);
    }
    Ok(key)
}
