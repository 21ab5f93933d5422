//! The product data-source seam.
//!
//! The catalog never talks to the network itself. It asks a [`ProductSource`]
//! for a page and receives already-validated [`Product`]s; normalization of
//! loosely shaped records happens here, at the boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storefront_core::{Price, Product, ProductId, ProductRecord};

/// A page of products as answered by the data source.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    /// The page number this response answers.
    pub page: u32,
    pub products: Vec<Product>,
    /// Whether a following page may exist.
    pub has_more: bool,
}

impl ProductPage {
    /// Normalize raw records into a page, skipping (and logging) any record
    /// that cannot be turned into a valid [`Product`].
    ///
    /// `requested_size` is the page size sent to the source, when one was sent;
    /// a full page then suggests more may follow.
    pub fn from_records(page: u32, records: Vec<ProductRecord>, requested_size: Option<usize>) -> Self {
        let received = records.len();
        let products: Vec<Product> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match Product::try_from(record) {
                Ok(product) => Some(product),
                Err(err) => {
                    tracing::warn!(page, index, error = %err, "skipping invalid product record");
                    None
                }
            })
            .collect();

        let has_more = match requested_size {
            Some(size) => size > 0 && received >= size,
            None => received > 0,
        };

        Self {
            page,
            products,
            has_more,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Network(_) => true,
            SourceError::Api(status, _) => *status == 429 || *status >= 500,
            SourceError::Parse(_) => false,
        }
    }
}

/// Query-by-page product endpoint.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch page `page` (1-based).
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError>;
}

#[async_trait]
impl<S> ProductSource for Arc<S>
where
    S: ProductSource + ?Sized,
{
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
        (**self).fetch_page(page).await
    }
}

#[async_trait]
impl<S> ProductSource for Box<S>
where
    S: ProductSource + ?Sized,
{
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
        (**self).fetch_page(page).await
    }
}

/// A fixed product collection held in memory.
///
/// Without a page size every request answers the whole collection (the
/// storefront then paginates client-side). With one, the source behaves like a
/// paged endpoint.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    products: Vec<Product>,
    page_size: Option<usize>,
}

impl InMemorySource {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            page_size: None,
        }
    }

    pub fn paged(products: Vec<Product>, page_size: usize) -> Self {
        Self {
            products,
            page_size: Some(page_size.max(1)),
        }
    }
}

#[async_trait]
impl ProductSource for InMemorySource {
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
        let Some(size) = self.page_size else {
            return Ok(ProductPage {
                page,
                products: self.products.clone(),
                has_more: false,
            });
        };

        let start = (page.max(1) as usize - 1).saturating_mul(size);
        let products: Vec<Product> = self.products.iter().skip(start).take(size).cloned().collect();
        let has_more = start.saturating_add(size) < self.products.len();
        Ok(ProductPage {
            page,
            products,
            has_more,
        })
    }
}

/// Deterministic sample catalog: `Item 1` .. `Item count`, roughly every other
/// item on sale.
pub fn demo_products(count: u64) -> Vec<Product> {
    (1..=count)
        .filter_map(|n| {
            let price = Price::from_cents(((n * 37) % 100 + 1) * 100 + (n * 13) % 100);
            let product = Product::new(ProductId::from(n), format!("Item {n}"), price)
                .ok()?
                .with_description("Lorem ipsum dolor sit amet, consectetur adipiscing elit.")
                .with_image("https://via.placeholder.com/150");
            if n % 2 == 0 {
                let discount = Price::from_cents(((n * 7) % 50 + 1) * price.cents() / 100);
                match price.checked_sub(discount) {
                    Some(sale) if !sale.is_zero() => product.on_sale_at(sale).ok(),
                    _ => Some(product),
                }
            } else {
                Some(product)
            }
        })
        .collect()
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based): doubles every time.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Wraps a source with retry and backoff on transient failures.
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl<S> ProductSource for RetryingSource<S>
where
    S: ProductSource,
{
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch_page(page).await {
                Ok(result) => {
                    if attempt > 0 {
                        tracing::debug!(page, attempt = attempt + 1, "page fetched after retry");
                    }
                    return Ok(result);
                }
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        page,
                        attempt = attempt + 1,
                        error = %err,
                        "fetching page failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use serde_json::json;
    use storefront_core::Entity;

    /// Fails with the queued errors first, then succeeds.
    struct FlakySource {
        failures: Mutex<Vec<SourceError>>,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: Vec<SourceError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProductSource for FlakySource {
        async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.failures.lock().unwrap().pop();
            match next {
                Some(err) => Err(err),
                None => Ok(ProductPage {
                    page,
                    products: demo_products(2),
                    has_more: false,
                }),
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn invalid_records_are_skipped() {
        let records: Vec<ProductRecord> = serde_json::from_value(json!([
            {"id": 1, "title": "Mug", "price": 3},
            {"id": 2, "price": 3},
            {"id": 3, "title": "Cup", "price": 4}
        ]))
        .unwrap();

        let page = ProductPage::from_records(1, records, Some(3));
        let ids: Vec<_> = page.products.iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, ["1", "3"]);
        assert!(page.has_more);
    }

    #[test]
    fn short_page_means_no_more() {
        let records: Vec<ProductRecord> =
            serde_json::from_value(json!([{"id": 1, "title": "Mug", "price": 3}])).unwrap();
        assert!(!ProductPage::from_records(2, records, Some(10)).has_more);
        assert!(!ProductPage::from_records(2, Vec::new(), None).has_more);
    }

    #[test]
    fn demo_products_respect_sale_invariant() {
        let products = demo_products(20);
        assert_eq!(products.len(), 20);
        assert!(products.iter().any(Product::is_on_sale));
        assert!(products.iter().any(|p| !p.is_on_sale()));
        for product in &products {
            if let Some(sale) = product.sale_price() {
                assert!(sale < product.price());
            }
        }
        assert_eq!(demo_products(20), products);
    }

    #[tokio::test]
    async fn in_memory_source_pages() {
        let source = InMemorySource::paged(demo_products(10), 4);
        let third = source.fetch_page(3).await.unwrap();
        assert_eq!(third.products.len(), 2);
        assert!(!third.has_more);
        assert!(source.fetch_page(1).await.unwrap().has_more);
        assert!(source.fetch_page(9).await.unwrap().products.is_empty());

        let whole = InMemorySource::new(demo_products(10));
        assert_eq!(whole.fetch_page(7).await.unwrap().products.len(), 10);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let inner = Arc::new(FlakySource::new(vec![
            SourceError::Api(503, "busy".into()),
            SourceError::Network("reset".into()),
        ]));
        let source = RetryingSource::new(inner.clone(), fast_policy(3));

        let page = source.fetch_page(1).await.unwrap();
        assert_eq!(page.products.len(), 2);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(FlakySource::new(vec![
            SourceError::Network("down".into()),
            SourceError::Network("down".into()),
            SourceError::Network("down".into()),
        ]));
        let source = RetryingSource::new(inner.clone(), fast_policy(2));

        let err = source.fetch_page(1).await.unwrap_err();
        assert_eq!(err, SourceError::Network("down".into()));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let inner = Arc::new(FlakySource::new(vec![SourceError::Api(404, "gone".into())]));
        let source = RetryingSource::new(inner.clone(), fast_policy(3));

        assert!(source.fetch_page(1).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }
}
