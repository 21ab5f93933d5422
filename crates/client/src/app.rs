//! Runtime wiring from [`ClientConfig`] to a ready [`Storefront`].

use storefront_cart::{CartStore, FileStore, StorageError, TracingNotifier};
use storefront_catalog::{CatalogEngine, InMemorySource, ProductSource, RetryingSource, demo_products};

use crate::config::{ClientConfig, SourceKind};
use crate::http::HttpProductSource;
use crate::session::Storefront;

/// Number of products in the offline demo catalog.
pub const DEMO_CATALOG_SIZE: u64 = 20;

pub type AppStorefront = Storefront<Box<dyn ProductSource>, FileStore, TracingNotifier>;

pub fn build_source(config: &ClientConfig) -> Box<dyn ProductSource> {
    match config.source {
        SourceKind::Http => {
            let http = HttpProductSource::new(&config.api_url).with_page_size(config.request_size());
            tracing::info!(url = %http.products_url(), retries = config.retry.max_retries, "using HTTP product source");
            Box::new(RetryingSource::new(http, config.retry))
        }
        SourceKind::Demo => {
            let products = demo_products(DEMO_CATALOG_SIZE);
            tracing::info!(count = products.len(), "using demo product source");
            match config.request_size().filter(|_| config.paged_source) {
                Some(size) => Box::new(InMemorySource::paged(products, size.get())),
                None => Box::new(InMemorySource::new(products)),
            }
        }
    }
}

pub fn build_storefront(config: &ClientConfig) -> Result<AppStorefront, StorageError> {
    let storage = match &config.data_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location()?,
    };
    tracing::info!(dir = %storage.dir().display(), "cart storage");

    let catalog = CatalogEngine::new(build_source(config), config.page_sizes)
        .with_paged_source(config.paged_source);
    let cart = CartStore::new(storage, TracingNotifier);
    Ok(Storefront::new(catalog, cart))
}
