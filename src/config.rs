use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::{serpapi, sightengine};
use crate::reuse::{normalize_domain, ReusePolicy, DEFAULT_OWN_STORAGE_DOMAIN, DEFAULT_STOCK_HOSTS};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub labeling_endpoint: String,
    pub labeling_api_key: Option<String>,

    pub sightengine_endpoint: String,
    pub sightengine_user: String,
    pub sightengine_secret: String,

    pub serpapi_endpoint: String,
    pub serpapi_key: String,

    /// Empty disables the own-storage carve-out.
    pub own_storage_domain: Option<String>,
    pub stock_hosts: Vec<String>,
    pub keywords_file: Option<PathBuf>,

    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub verify_timeout: Duration,
    pub max_image_bytes: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests can feed a map
    /// instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secret = |key: &str| lookup(key).unwrap_or_default();

        let stock_hosts = match lookup("STOCK_HOSTS") {
            Some(raw) => raw
                .split(',')
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            None => DEFAULT_STOCK_HOSTS.iter().map(|h| h.to_string()).collect(),
        };

        // "https://res.cloudinary.com/" and "res.cloudinary.com" are the same domain
        let own_storage_domain =
            normalize_domain(&get("OWN_STORAGE_DOMAIN", DEFAULT_OWN_STORAGE_DOMAIN));

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 3000)?,
            labeling_endpoint: get("LABELING_ENDPOINT", "http://127.0.0.1:9000/detect-labels"),
            labeling_api_key: lookup("LABELING_API_KEY").filter(|k| !k.is_empty()),
            sightengine_endpoint: get("SIGHTENGINE_ENDPOINT", sightengine::DEFAULT_ENDPOINT),
            sightengine_user: secret("SIGHTENGINE_USER"),
            sightengine_secret: secret("SIGHTENGINE_SECRET"),
            serpapi_endpoint: get("SERPAPI_ENDPOINT", serpapi::DEFAULT_ENDPOINT),
            serpapi_key: secret("SERPAPI_KEY"),
            own_storage_domain,
            stock_hosts,
            keywords_file: lookup("CATEGORY_KEYWORDS_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            connect_timeout: Duration::from_secs(parse(&lookup, "CONNECT_TIMEOUT_SECS", 10)?),
            request_timeout: Duration::from_secs(parse(&lookup, "REQUEST_TIMEOUT_SECS", 10)?),
            verify_timeout: Duration::from_secs(parse(&lookup, "VERIFY_TIMEOUT_SECS", 45)?),
            max_image_bytes: parse(&lookup, "MAX_IMAGE_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn reuse_policy(&self) -> ReusePolicy {
        ReusePolicy {
            stock_hosts: self.stock_hosts.clone(),
            own_storage_domain: self.own_storage_domain.clone(),
        }
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(default),
    }
}
