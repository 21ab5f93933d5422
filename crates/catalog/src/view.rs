//! Pure pagination and filtering over a product collection.

use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use storefront_core::Product;

/// Which subset of the catalog is being browsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every product (the default storefront view).
    #[default]
    All,
    /// Only products currently on sale (the sales view).
    OnSale,
}

impl FilterMode {
    pub fn matches(self, product: &Product) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::OnSale => product.is_on_sale(),
        }
    }
}

/// Display class of the viewport the page is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
    Compact,
    Regular,
}

impl Viewport {
    /// Widths strictly below this are compact.
    pub const COMPACT_BELOW_PX: u32 = 640;

    pub fn from_width(width_px: u32) -> Self {
        if width_px < Self::COMPACT_BELOW_PX {
            Viewport::Compact
        } else {
            Viewport::Regular
        }
    }
}

/// Page size per viewport class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePolicy {
    compact: NonZeroUsize,
    regular: NonZeroUsize,
}

impl PageSizePolicy {
    pub const DEFAULT_COMPACT: NonZeroUsize = NonZeroUsize::new(4).unwrap();
    pub const DEFAULT_REGULAR: NonZeroUsize = NonZeroUsize::new(8).unwrap();

    pub fn new(compact: NonZeroUsize, regular: NonZeroUsize) -> Self {
        Self { compact, regular }
    }

    /// The same page size regardless of viewport.
    pub fn fixed(size: NonZeroUsize) -> Self {
        Self::new(size, size)
    }

    pub fn page_size(&self, viewport: Viewport) -> NonZeroUsize {
        match viewport {
            Viewport::Compact => self.compact,
            Viewport::Regular => self.regular,
        }
    }
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COMPACT, Self::DEFAULT_REGULAR)
    }
}

/// One rendered page of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisiblePage {
    /// Requested page number (1-based; may be out of range).
    pub page: u32,
    pub items: Vec<Product>,
    /// `ceil(total_items / page_size)`, `0` when nothing matches the filter.
    pub total_pages: u32,
    /// Number of products matching the filter, across all pages. For a paged
    /// source only the loaded page is known, so only it is counted.
    pub total_items: usize,
}

impl VisiblePage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice `products` down to page `page` of the `mode` subset.
///
/// Pages are 1-based. Page `0` or a page past the end yields an empty item list
/// with the correct `total_pages`; it is never an error.
pub fn paginate(
    products: &[Product],
    mode: FilterMode,
    page: u32,
    page_size: NonZeroUsize,
) -> VisiblePage {
    let size = page_size.get();
    let filtered: Vec<&Product> = products.iter().filter(|p| mode.matches(p)).collect();
    let total_items = filtered.len();
    let total_pages = u32::try_from(total_items.div_ceil(size)).unwrap_or(u32::MAX);

    let items = if page == 0 || page > total_pages {
        tracing::debug!(page, total_pages, "requested page is out of range");
        Vec::new()
    } else {
        // page <= total_pages, so start < total_items and cannot overflow.
        let start = (page as usize - 1) * size;
        filtered
            .into_iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect()
    };

    VisiblePage {
        page,
        items,
        total_pages,
        total_items,
    }
}
