//! Browsing session glue: routes drive the catalog, "add to cart" drives the
//! cart store.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use storefront_cart::{Cart, CartError, CartStore, KeyValueStore, Notifier, ToggleResult};
use storefront_catalog::{
    CatalogEngine, CatalogError, ProductSource, RefreshOutcome, Viewport, VisiblePage,
};
use storefront_core::ProductId;

use crate::route::Route;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("product {0} is not in the current catalog")]
    UnknownProduct(ProductId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// One visitor's storefront: the catalog engine, the cart store and the
/// active route.
pub struct Storefront<S, K, N> {
    catalog: CatalogEngine<S>,
    cart: CartStore<K, N>,
    route: Mutex<Route>,
}

impl<S, K, N> Storefront<S, K, N>
where
    S: ProductSource,
    K: KeyValueStore,
    N: Notifier,
{
    pub fn new(catalog: CatalogEngine<S>, cart: CartStore<K, N>) -> Self {
        Self {
            catalog,
            cart,
            route: Mutex::new(Route::Home),
        }
    }

    pub fn catalog(&self) -> &CatalogEngine<S> {
        &self.catalog
    }

    pub fn cart(&self) -> &CartStore<K, N> {
        &self.cart
    }

    pub fn route(&self) -> Route {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enter `route`. A catalog route selects its filter mode, returns to page 1
    /// and reloads the first page. Other routes leave the catalog alone.
    ///
    /// A failed reload keeps the previous products on screen.
    pub async fn navigate(&self, route: Route) -> Result<Option<RefreshOutcome>, SessionError> {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route;
        tracing::debug!(%route, "navigated");

        let Some(mode) = route.filter_mode() else {
            return Ok(None);
        };

        self.catalog.set_filter_mode(mode);
        let outcome = match self.catalog.change_page(1).await? {
            Some(outcome) => outcome,
            None => self.catalog.refresh(1).await?,
        };
        Ok(Some(outcome))
    }

    /// Move to `page` within the current catalog route.
    pub async fn change_page(&self, page: u32) -> Result<Option<RefreshOutcome>, SessionError> {
        Ok(self.catalog.change_page(page).await?)
    }

    /// Toggle the product with `id` from the catalog currently on screen.
    pub fn add_to_cart(&self, id: &ProductId) -> Result<ToggleResult, SessionError> {
        let product = self
            .catalog
            .find(id)
            .ok_or_else(|| SessionError::UnknownProduct(id.clone()))?;
        Ok(self.cart.toggle_item(&product)?)
    }

    /// Cart size shown on the navigation badge.
    pub fn badge_count(&self) -> usize {
        self.cart.item_count()
    }

    pub fn cart_items(&self) -> Cart {
        self.cart.items()
    }

    pub fn visible_page(&self, viewport: Viewport) -> VisiblePage {
        self.catalog.visible_page(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_cart::{MemoryStore, RecordingNotifier, ToggleOutcome};
    use storefront_catalog::{FilterMode, InMemorySource, PageSizePolicy, demo_products};

    fn storefront() -> Storefront<InMemorySource, MemoryStore, RecordingNotifier> {
        let catalog = CatalogEngine::new(InMemorySource::new(demo_products(20)), PageSizePolicy::default());
        let cart = CartStore::new(MemoryStore::new(), RecordingNotifier::new());
        Storefront::new(catalog, cart)
    }

    #[tokio::test]
    async fn cart_route_leaves_catalog_untouched() {
        let shop = storefront();
        assert_eq!(shop.navigate(Route::Cart).await.unwrap(), None);
        assert_eq!(shop.route(), Route::Cart);
        assert!(shop.catalog().products().is_empty());
    }

    #[tokio::test]
    async fn sales_route_filters_and_resets_page() {
        let shop = storefront();
        shop.navigate(Route::Home).await.unwrap();
        shop.change_page(3).await.unwrap();
        assert_eq!(shop.catalog().current_page(), 3);

        let outcome = shop.navigate(Route::Sales).await.unwrap();
        assert!(matches!(outcome, Some(RefreshOutcome::Applied { page: 1, .. })));
        assert_eq!(shop.catalog().filter_mode(), FilterMode::OnSale);
        assert_eq!(shop.catalog().current_page(), 1);
        assert!(shop.visible_page(Viewport::Regular).items.iter().all(|p| p.is_on_sale()));
    }

    #[tokio::test]
    async fn unknown_product_is_reported() {
        let shop = storefront();
        shop.navigate(Route::Home).await.unwrap();
        let err = shop.add_to_cart(&ProductId::from(999)).unwrap_err();
        assert!(matches!(err, SessionError::UnknownProduct(_)));
        assert_eq!(shop.badge_count(), 0);
    }

    #[tokio::test]
    async fn add_to_cart_toggles() {
        let shop = storefront();
        shop.navigate(Route::Home).await.unwrap();
        let id = ProductId::from(2);
        assert_eq!(shop.add_to_cart(&id).unwrap().outcome, ToggleOutcome::Added);
        assert_eq!(shop.badge_count(), 1);
        assert_eq!(shop.add_to_cart(&id).unwrap().outcome, ToggleOutcome::Removed);
        assert_eq!(shop.badge_count(), 0);
    }
}
