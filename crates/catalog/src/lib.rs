//! Catalog view engine.
//!
//! This crate derives the visible, paginated and filtered slice of the product
//! collection, and keeps that collection fresh from a [`ProductSource`] with
//! last-request-wins semantics. It performs no rendering and owns no transport:
//! the data source is a trait seam implemented by the client crate.

pub mod engine;
pub mod source;
pub mod view;

pub use engine::{CatalogEngine, CatalogError, RefreshOutcome, ViewSignal};
pub use source::{
    InMemorySource, ProductPage, ProductSource, RetryPolicy, RetryingSource, SourceError,
    demo_products,
};
pub use view::{FilterMode, PageSizePolicy, Viewport, VisiblePage, paginate};
