//! HTTP product source: `GET {api}/products?page=N[&size=M]`.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use reqwest::Url;

use storefront_catalog::{ProductPage, ProductSource, SourceError};
use storefront_core::ProductRecord;

/// Talks to the product endpoint. The response body is a JSON array of loosely
/// shaped product records.
#[derive(Debug, Clone)]
pub struct HttpProductSource {
    client: reqwest::Client,
    products_url: Url,
    page_size: Option<NonZeroUsize>,
}

impl HttpProductSource {
    pub fn new(api_url: &Url) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: &Url) -> Self {
        let mut products_url = api_url.clone();
        let path = format!("{}/products", api_url.path().trim_end_matches('/'));
        products_url.set_path(&path);
        Self {
            client,
            products_url,
            page_size: None,
        }
    }

    /// Send `size` with every request.
    pub fn with_page_size(mut self, size: Option<NonZeroUsize>) -> Self {
        self.page_size = size;
        self
    }

    pub fn products_url(&self) -> &Url {
        &self.products_url
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn fetch_page(&self, page: u32) -> Result<ProductPage, SourceError> {
        let mut req = self
            .client
            .get(self.products_url.clone())
            .query(&[("page", page)]);
        if let Some(size) = self.page_size {
            req = req.query(&[("size", size.get())]);
        }

        let resp = req.send().await.map_err(|e| SourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let body = resp.text().await.map_err(|e| SourceError::Network(e.to_string()))?;
        let records = decode_records(page, &body)?;
        tracing::debug!(page, received = records.len(), "product page received");

        Ok(ProductPage::from_records(
            page,
            records,
            self.page_size.map(NonZeroUsize::get),
        ))
    }
}

/// The body must be an array; an element that is not record-shaped is skipped.
fn decode_records(page: u32, body: &str) -> Result<Vec<ProductRecord>, SourceError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<ProductRecord>(value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(page, index, error = %err, "skipping malformed product record");
                None
            }
        })
        .collect())
}
