use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, Price, Product, ProductId};

/// A frozen snapshot of a product taken when it was added to the cart.
///
/// Never updated afterwards, even if the product's price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    id: ProductId,
    title: String,
    price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_at: Option<DateTime<Utc>>,
}

impl CartLineItem {
    /// Snapshot `product` now. The price is the sale price when on sale.
    pub fn snapshot(product: &Product) -> Self {
        Self::snapshot_at(product, Utc::now())
    }

    pub fn snapshot_at(product: &Product, added_at: DateTime<Utc>) -> Self {
        Self {
            id: product.id().clone(),
            title: product.title().to_string(),
            price: product.effective_price(),
            added_at: Some(added_at),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// When the item was added; absent for carts persisted before timestamps existed.
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at
    }
}

impl Entity for CartLineItem {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Ordered line items with unique product ids. Presence is binary: there are
/// no quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl From<Vec<CartLineItem>> for Cart {
    /// Keeps the first occurrence of each id, so a hand-edited or legacy list
    /// with duplicates still yields a valid cart.
    fn from(items: Vec<CartLineItem>) -> Self {
        let mut cart = Cart::default();
        for item in items {
            if !cart.contains(item.id()) {
                cart.items.push(item);
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// Sum of the snapshot prices.
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartLineItem::price).sum()
    }

    /// Remove the item with the same id if present, otherwise append `item`.
    ///
    /// Returns the outcome and the affected line item (the stored one on removal).
    pub fn toggle(&mut self, item: CartLineItem) -> (ToggleOutcome, CartLineItem) {
        match self.items.iter().position(|existing| existing.same_entity(&item)) {
            Some(index) => (ToggleOutcome::Removed, self.items.remove(index)),
            None => {
                self.items.push(item.clone());
                (ToggleOutcome::Added, item)
            }
        }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLineItem;
    type IntoIter = std::slice::Iter<'a, CartLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
