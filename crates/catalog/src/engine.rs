//! Catalog state: the held product collection plus the page/filter cursor.
//!
//! - Refreshes are last-request-wins: every `refresh` takes a ticket, and a
//!   response is applied only if its ticket is still the newest one.
//! - A failed refresh keeps the last good collection.
//! - The state lock is never held across an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};

use storefront_core::{Entity, Product, ProductId};

use crate::source::{ProductSource, SourceError};
use crate::view::{FilterMode, PageSizePolicy, Viewport, VisiblePage, paginate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to fetch page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: SourceError,
    },
}

/// What happened to a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the held collection.
    Applied { page: u32, count: usize },
    /// A newer refresh was issued while this one was in flight; its result was discarded.
    Superseded { page: u32 },
    /// Page `0` was requested; nothing was fetched.
    Skipped,
}

/// Presentation side effects published to view subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSignal {
    ScrollToTop,
    CatalogReplaced { page: u32, count: usize },
    FilterModeChanged(FilterMode),
}

#[derive(Debug)]
struct CatalogState {
    page: u32,
    mode: FilterMode,
    products: Arc<[Product]>,
    loaded_page: Option<u32>,
    has_more: bool,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            page: 1,
            mode: FilterMode::All,
            products: Arc::from(Vec::new()),
            loaded_page: None,
            has_more: false,
        }
    }
}

/// The catalog view engine.
pub struct CatalogEngine<S> {
    source: S,
    policy: PageSizePolicy,
    paged_source: bool,
    state: Mutex<CatalogState>,
    latest_request: AtomicU64,
    subscribers: Mutex<Vec<mpsc::Sender<ViewSignal>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State is replaced wholesale under the lock, so a poisoned guard is still consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S> CatalogEngine<S>
where
    S: ProductSource,
{
    pub fn new(source: S, policy: PageSizePolicy) -> Self {
        Self {
            source,
            policy,
            paged_source: false,
            state: Mutex::new(CatalogState::default()),
            latest_request: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Declare that the source answers one page per request, so page changes
    /// must fetch rather than re-slice the held collection.
    pub fn with_paged_source(mut self, paged: bool) -> Self {
        self.paged_source = paged;
        self
    }

    pub fn is_paged_source(&self) -> bool {
        self.paged_source
    }

    pub fn current_page(&self) -> u32 {
        lock(&self.state).page
    }

    pub fn filter_mode(&self) -> FilterMode {
        lock(&self.state).mode
    }

    /// Page number of the most recently applied response, if any.
    pub fn loaded_page(&self) -> Option<u32> {
        lock(&self.state).loaded_page
    }

    /// Whether the source reported that more pages follow the loaded one.
    pub fn has_more(&self) -> bool {
        lock(&self.state).has_more
    }

    /// Immutable snapshot of the held collection.
    pub fn products(&self) -> Arc<[Product]> {
        Arc::clone(&lock(&self.state).products)
    }

    /// Look a product up in the held collection.
    pub fn find(&self, id: &ProductId) -> Option<Product> {
        lock(&self.state)
            .products
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    /// Receive presentation signals (scroll resets, catalog replacement).
    pub fn subscribe(&self) -> mpsc::Receiver<ViewSignal> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    fn publish(&self, signal: ViewSignal) {
        // Drop any dead subscribers while publishing.
        lock(&self.subscribers).retain(|tx| tx.send(signal).is_ok());
    }

    /// Switch between the full catalog and the sale view.
    ///
    /// A real switch resets the page to 1; re-selecting the active mode changes
    /// nothing. Returns whether the mode changed.
    pub fn set_filter_mode(&self, mode: FilterMode) -> bool {
        {
            let mut state = lock(&self.state);
            if state.mode == mode {
                return false;
            }
            state.mode = mode;
            state.page = 1;
        }
        tracing::debug!(?mode, "filter mode changed; page reset to 1");
        self.publish(ViewSignal::FilterModeChanged(mode));
        true
    }

    /// Fetch `page` from the source and, unless superseded, replace the held
    /// collection with it.
    pub async fn refresh(&self, page: u32) -> Result<RefreshOutcome, CatalogError> {
        if page == 0 {
            tracing::debug!("refresh of page 0 ignored");
            return Ok(RefreshOutcome::Skipped);
        }

        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.source.fetch_page(page).await;

        match result {
            Ok(fetched) => {
                let count = fetched.products.len();
                {
                    let mut state = lock(&self.state);
                    if self.latest_request.load(Ordering::SeqCst) != ticket {
                        tracing::debug!(page, ticket, "discarding superseded catalog response");
                        return Ok(RefreshOutcome::Superseded { page });
                    }
                    state.products = Arc::from(fetched.products);
                    state.loaded_page = Some(page);
                    state.has_more = fetched.has_more;
                }
                tracing::info!(page, count, "catalog refreshed");
                self.publish(ViewSignal::CatalogReplaced { page, count });
                Ok(RefreshOutcome::Applied { page, count })
            }
            Err(err) if self.latest_request.load(Ordering::SeqCst) != ticket => {
                tracing::debug!(page, error = %err, "superseded catalog request failed");
                Ok(RefreshOutcome::Superseded { page })
            }
            Err(err) => {
                tracing::warn!(page, error = %err, "catalog refresh failed; keeping last-known products");
                Err(CatalogError::Fetch { page, source: err })
            }
        }
    }

    /// Move to `page`: reset the scroll position and, for a paged source, fetch it.
    pub async fn change_page(&self, page: u32) -> Result<Option<RefreshOutcome>, CatalogError> {
        lock(&self.state).page = page;
        self.publish(ViewSignal::ScrollToTop);

        if self.paged_source {
            self.refresh(page).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// The slice of the held collection for `page` under the active filter.
    ///
    /// For a paged source a visible page is exactly one source page: the held
    /// collection is shown whole when `page` is the loaded page, and any other
    /// page is empty until it has been fetched. The viewport page size only
    /// applies to client-side pagination.
    pub fn compute_visible_page(&self, page: u32, viewport: Viewport) -> VisiblePage {
        let (products, mode, loaded_page, has_more) = {
            let state = lock(&self.state);
            (Arc::clone(&state.products), state.mode, state.loaded_page, state.has_more)
        };

        if self.paged_source {
            paged_view(&products, mode, page, loaded_page, has_more)
        } else {
            paginate(&products, mode, page, self.policy.page_size(viewport))
        }
    }

    /// [`compute_visible_page`](Self::compute_visible_page) at the current page.
    pub fn visible_page(&self, viewport: Viewport) -> VisiblePage {
        self.compute_visible_page(self.current_page(), viewport)
    }
}

/// View of a paged source. Only pages up to the loaded one (plus one, if the
/// source says more follow) are known; an empty last page is not counted.
fn paged_view(
    held: &[Product],
    mode: FilterMode,
    page: u32,
    loaded_page: Option<u32>,
    has_more: bool,
) -> VisiblePage {
    let total_pages = match loaded_page {
        None => 0,
        Some(loaded) if held.is_empty() && !has_more => loaded.saturating_sub(1),
        Some(loaded) => loaded.saturating_add(u32::from(has_more)),
    };

    let items: Vec<Product> = if page != 0 && loaded_page == Some(page) {
        held.iter().filter(|p| mode.matches(p)).cloned().collect()
    } else {
        tracing::debug!(page, ?loaded_page, "requested page is not loaded");
        Vec::new()
    };

    VisiblePage {
        page,
        total_items: items.len(),
        items,
        total_pages,
    }
}
