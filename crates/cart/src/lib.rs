//! Cart store.
//!
//! **Responsibility:** the visitor's cart as a deduplicated, togglable set of
//! line items that survives reloads.
//!
//! - [`Cart`] / [`CartLineItem`]: pure cart model (no IO)
//! - [`KeyValueStore`]: the durable key-value substrate the cart is persisted in
//! - [`Notifier`]: fire-and-forget user feedback
//! - [`CartStore`]: read-modify-write toggling over the two seams above

pub mod cart;
pub mod notify;
pub mod storage;
pub mod store;

pub use cart::{Cart, CartLineItem, ToggleOutcome};
pub use notify::{Notice, NoticeKind, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{CART_KEY, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartError, CartStore, ToggleResult};
