//! Client configuration, read once from the environment at start-up.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;
use thiserror::Error;

use storefront_catalog::{PageSizePolicy, RetryPolicy, Viewport};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API URL {value:?}: {reason}")]
    InvalidApiUrl { value: String, reason: String },
}

/// Where products come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Http,
    /// A generated in-process catalog, for running without a backend.
    Demo,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(SourceKind::Http),
            "demo" => Ok(SourceKind::Demo),
            other => Err(format!("unknown source kind {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub source: SourceKind,
    pub page_sizes: PageSizePolicy,
    /// Explicit `size` query parameter sent to the product endpoint.
    pub fetch_size: Option<NonZeroUsize>,
    /// Whether the product endpoint answers one page per request. Defaults to
    /// `true` for the HTTP source, whose backend pages with `page`/`size`.
    pub paged_source: bool,
    /// Cart storage directory; `None` means the OS data directory.
    pub data_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Malformed optional values fall
    /// back to their defaults with a warning; only the API URL is fatal.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("STOREFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&raw_url)?;

        let regular = parsed(&lookup, "STOREFRONT_PAGE_SIZE").unwrap_or(PageSizePolicy::DEFAULT_REGULAR);
        let compact =
            parsed(&lookup, "STOREFRONT_COMPACT_PAGE_SIZE").unwrap_or(PageSizePolicy::DEFAULT_COMPACT);

        let retry = match parsed::<u32, _>(&lookup, "STOREFRONT_FETCH_RETRIES") {
            Some(max_retries) => RetryPolicy {
                max_retries,
                ..RetryPolicy::default()
            },
            None => RetryPolicy::default(),
        };

        let source: SourceKind = parsed(&lookup, "STOREFRONT_SOURCE").unwrap_or_default();

        Ok(Self {
            api_url,
            source,
            page_sizes: PageSizePolicy::new(compact, regular),
            fetch_size: parsed(&lookup, "STOREFRONT_FETCH_SIZE"),
            paged_source: parsed(&lookup, "STOREFRONT_PAGED_SOURCE")
                .unwrap_or(source == SourceKind::Http),
            data_dir: lookup("STOREFRONT_DATA_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            retry,
        })
    }

    /// Page size to request from the source. A paged source always gets one:
    /// the configured fetch size, or else the regular page size.
    pub fn request_size(&self) -> Option<NonZeroUsize> {
        if self.paged_source {
            Some(
                self.fetch_size
                    .unwrap_or(self.page_sizes.page_size(Viewport::Regular)),
            )
        } else {
            self.fetch_size
        }
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    Ok(url)
}

/// Parse `key` if set. A value that does not parse is ignored with a warning.
fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(cfg.source, SourceKind::Http);
        assert_eq!(cfg.page_sizes, PageSizePolicy::default());
        assert_eq!(cfg.fetch_size, None);
        assert!(cfg.paged_source);
        assert_eq!(cfg.request_size(), NonZeroUsize::new(8));
        assert_eq!(cfg.data_dir, None);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn reads_every_setting() {
        let cfg = config(&[
            ("STOREFRONT_API_URL", "https://shop.example.com/api"),
            ("STOREFRONT_SOURCE", "Demo"),
            ("STOREFRONT_PAGE_SIZE", "12"),
            ("STOREFRONT_COMPACT_PAGE_SIZE", "6"),
            ("STOREFRONT_FETCH_SIZE", "24"),
            ("STOREFRONT_PAGED_SOURCE", "true"),
            ("STOREFRONT_DATA_DIR", "/tmp/shop"),
            ("STOREFRONT_FETCH_RETRIES", "0"),
        ])
        .unwrap();

        assert_eq!(cfg.api_url.host_str(), Some("shop.example.com"));
        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(
            cfg.page_sizes,
            PageSizePolicy::new(NonZeroUsize::new(6).unwrap(), NonZeroUsize::new(12).unwrap())
        );
        assert_eq!(cfg.fetch_size, NonZeroUsize::new(24));
        assert!(cfg.paged_source);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/tmp/shop")));
        assert_eq!(cfg.retry.max_retries, 0);
    }

    #[test]
    fn malformed_values_fall_back() {
        let cfg = config(&[
            ("STOREFRONT_PAGE_SIZE", "0"),
            ("STOREFRONT_COMPACT_PAGE_SIZE", "four"),
            ("STOREFRONT_PAGED_SOURCE", "yes please"),
            ("STOREFRONT_SOURCE", "ftp"),
            ("STOREFRONT_FETCH_RETRIES", "-1"),
        ])
        .unwrap();
        assert_eq!(cfg.page_sizes, PageSizePolicy::default());
        assert!(cfg.paged_source);
        assert_eq!(cfg.source, SourceKind::Http);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn paging_follows_the_source_kind() {
        let demo = config(&[("STOREFRONT_SOURCE", "demo")]).unwrap();
        assert!(!demo.paged_source);
        assert_eq!(demo.request_size(), None);

        let unpaged_http = config(&[("STOREFRONT_PAGED_SOURCE", "false")]).unwrap();
        assert!(!unpaged_http.paged_source);
        assert_eq!(unpaged_http.request_size(), None);

        let sized = config(&[("STOREFRONT_FETCH_SIZE", "10")]).unwrap();
        assert_eq!(sized.request_size(), NonZeroUsize::new(10));
    }

    #[test]
    fn bad_api_url_is_an_error() {
        assert!(matches!(
            config(&[("STOREFRONT_API_URL", "not a url")]),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            config(&[("STOREFRONT_API_URL", "ftp://files.example.com")]),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
    }
}
