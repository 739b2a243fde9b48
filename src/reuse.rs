use std::sync::Arc;

use crate::services::ReverseImageSearchService;

/// Stock and photo-sharing hosts that count as "published elsewhere".
pub const DEFAULT_STOCK_HOSTS: &[&str] = &[
    "pinterest",
    "shutterstock",
    "istock",
    "gettyimages",
    "unsplash",
    "pexels",
    "pixabay",
    "alamy",
    "wikimedia",
];

/// Where the service re-hosts uploaded photos.
pub const DEFAULT_OWN_STORAGE_DOMAIN: &str = "res.cloudinary.com";

#[derive(Debug, Clone)]
pub struct ReusePolicy {
    /// Substrings matched against every search hit URL.
    pub stock_hosts: Vec<String>,
    /// Images served from this domain are never reported as reused.
    pub own_storage_domain: Option<String>,
}

impl Default for ReusePolicy {
    fn default() -> Self {
        Self {
            stock_hosts: DEFAULT_STOCK_HOSTS.iter().map(|h| h.to_string()).collect(),
            own_storage_domain: Some(DEFAULT_OWN_STORAGE_DOMAIN.to_string()),
        }
    }
}

impl ReusePolicy {
    pub fn is_stock_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.stock_hosts
            .iter()
            .any(|host| lower.contains(host.to_lowercase().as_str()))
    }

    /// True when `image_url`'s host is the storage domain or a subdomain of it.
    pub fn is_own_storage(&self, image_url: &str) -> bool {
        let Some(domain) = self.own_storage_domain.as_deref().and_then(normalize_domain) else {
            return false;
        };
        let host = url::Url::parse(image_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_lowercase()));
        match host {
            Some(host) => host == domain || host.ends_with(&format!(".{}", domain)),
            None => false,
        }
    }
}

/// Reduces a configured domain to a bare lowercase host, so
/// `https://res.cloudinary.com/`, `res.cloudinary.com.` and
/// `res.cloudinary.com` all mean the same thing. `None` when nothing is left.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let host = if trimmed.contains("://") {
        url::Url::parse(trimmed).ok()?.host_str()?.to_string()
    } else {
        trimmed.split('/').next().unwrap_or_default().to_string()
    };
    let host = host.trim_matches('.').to_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Decides whether a photo already exists on a known stock/photo host.
///
/// Search failures, empty results and images on our own storage all
/// yield `false` ("not reused").
#[derive(Clone)]
pub struct ReuseChecker {
    search: Arc<dyn ReverseImageSearchService>,
    policy: Arc<ReusePolicy>,
}

impl ReuseChecker {
    pub fn new(search: Arc<dyn ReverseImageSearchService>, policy: ReusePolicy) -> Self {
        Self {
            search,
            policy: Arc::new(policy),
        }
    }

    pub async fn is_reused(&self, image_url: &str) -> bool {
        let matches = match self.search.search(image_url).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(
                    image_url,
                    error = %e,
                    "reverse image search failed, treating image as not reused"
                );
                return false;
            }
        };

        if matches.is_empty() {
            tracing::info!(image_url, "no visually similar images found, not reused");
            return false;
        }

        let stock_hits: Vec<&str> = matches
            .iter()
            .map(|m| m.url.as_str())
            .filter(|url| self.policy.is_stock_url(url))
            .collect();

        let mut reused = !stock_hits.is_empty();
        if reused && self.policy.is_own_storage(image_url) {
            tracing::info!(
                image_url,
                "image is served from own storage, ignoring stock host matches"
            );
            reused = false;
        }

        tracing::info!(
            image_url,
            total_matches = matches.len(),
            stock_hits = ?stock_hits,
            reused,
            "reverse image search evaluated"
        );
        reused
    }
}
