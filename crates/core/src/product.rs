//! The product shape shared by the catalog and the cart.
//!
//! Records coming from the data source are loosely shaped (the storefront has
//! gone through `sale`/`hasDiscount`/`discount` and `on_sale`/`sale_price`
//! iterations). [`ProductRecord`] accepts all of them and [`Product`] is the one
//! validated form the rest of the workspace sees.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::ProductId;
use crate::money::Price;

/// A product as fetched from the data source. Immutable once built.
///
/// Invariant: `on_sale() ⇒ sale_price < price`, and a product that is not on
/// sale carries no sale price at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord")]
pub struct Product {
    id: ProductId,
    title: String,
    description: String,
    price: Price,
    on_sale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sale_price: Option<Price>,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

impl Product {
    /// Create a regular-priced product.
    pub fn new(id: ProductId, title: impl Into<String>, price: Price) -> DomainResult<Self> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        Ok(Self {
            id,
            title: title.to_string(),
            description: String::new(),
            price,
            on_sale: false,
            sale_price: None,
            image: String::new(),
            category: None,
            rating: None,
            quantity: None,
        })
    }

    /// Put the product on sale. Fails unless `0 < sale_price < price`.
    pub fn on_sale_at(mut self, sale_price: Price) -> DomainResult<Self> {
        if sale_price.is_zero() {
            return Err(DomainError::invariant("sale price must be greater than 0"));
        }
        if sale_price >= self.price {
            return Err(DomainError::invariant(format!(
                "sale price {sale_price} must be less than price {}",
                self.price
            )));
        }
        self.on_sale = true;
        self.sale_price = Some(sale_price);
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Base (regular) price.
    pub fn price(&self) -> Price {
        self.price
    }

    pub fn is_on_sale(&self) -> bool {
        self.on_sale
    }

    pub fn sale_price(&self) -> Option<Price> {
        self.sale_price
    }

    /// The price a buyer pays right now: the sale price when on sale, else the base price.
    pub fn effective_price(&self) -> Price {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn rating(&self) -> Option<f32> {
        self.rating
    }

    /// Units in stock, when the data source reports it.
    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Wire shape of a product record, tolerant of every field naming the data
/// source has used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<ProductId>,
    /// Document-store key; used only when `id` is absent.
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub on_sale: Option<bool>,
    #[serde(default)]
    pub sale: Option<bool>,
    #[serde(default, rename = "hasDiscount")]
    pub has_discount: Option<bool>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = DomainError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .or(record.mongo_id)
            .ok_or_else(|| DomainError::validation("product record has no id"))?;
        let title = record
            .title
            .or(record.name)
            .ok_or_else(|| DomainError::validation(format!("product {id} has no title")))?;
        let price = record
            .price
            .ok_or_else(|| DomainError::validation(format!("product {id} has no price")))
            .and_then(Price::from_decimal)?;

        let mut product = Product::new(id, title, price)?;
        product.description = record.description.unwrap_or_default();
        product.image = record.image.unwrap_or_default();
        product.category = record.category.filter(|c| !c.trim().is_empty());
        product.rating = record
            .rating
            .filter(|r| (0.0..=5.0).contains(r))
            .map(|r| r as f32);
        product.quantity = record.quantity.and_then(|q| u32::try_from(q).ok());

        let claims_sale = record
            .on_sale
            .or(record.sale)
            .or(record.has_discount)
            .unwrap_or(false);
        if !claims_sale {
            return Ok(product);
        }

        let sale_price = match (record.sale_price, record.discount) {
            (Some(sale_price), _) => Price::from_decimal(sale_price).ok(),
            (None, Some(discount)) if discount > 0.0 => Price::from_decimal(discount)
                .ok()
                .and_then(|d| price.checked_sub(d)),
            _ => None,
        };

        match sale_price.map(|sp| product.clone().on_sale_at(sp)) {
            Some(Ok(on_sale)) => Ok(on_sale),
            Some(Err(err)) => {
                tracing::warn!(product_id = %product.id, error = %err, "sale flag ignored");
                Ok(product)
            }
            None => {
                tracing::warn!(product_id = %product.id, "on-sale product has no usable sale price; listing at base price");
                Ok(product)
            }
        }
    }
}
