use anyhow::Context;
use storefront_catalog::Viewport;
use storefront_client::{ClientConfig, Route, app::build_storefront};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = ClientConfig::from_env().context("invalid storefront configuration")?;

    let route: Route = match std::env::args().nth(1) {
        Some(path) => path.parse()?,
        None => Route::Home,
    };

    let shop = build_storefront(&config).context("failed to open cart storage")?;

    if let Err(err) = shop.navigate(route).await {
        tracing::warn!(%route, error = %err, "catalog unavailable; showing last known products");
    }

    if route.filter_mode().is_some() {
        let page = shop.visible_page(Viewport::Regular);
        tracing::info!(
            %route,
            page = page.page,
            total_pages = page.total_pages,
            shown = page.items.len(),
            "catalog page"
        );
        for product in &page.items {
            tracing::info!(title = product.title(), price = %product.effective_price(), on_sale = product.is_on_sale(), "product");
        }
    }

    if route == Route::Cart {
        let cart = shop.cart_items();
        for item in &cart {
            tracing::info!(title = item.title(), price = %item.price(), "cart item");
        }
        tracing::info!(subtotal = %cart.subtotal(), "cart subtotal");
    }

    tracing::info!(count = shop.badge_count(), "cart badge");
    Ok(())
}
