//! `storefront-core`: shared domain primitives.
//!
//! This crate contains **pure domain** building blocks used by both the catalog
//! and the cart, including the validated [`Product`] shape (no IO, no async, no storage).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod product;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ProductId;
pub use money::Price;
pub use product::{Product, ProductRecord};
