//! Storefront client: configuration, HTTP product source, routes and the
//! session that ties the catalog engine to the cart store.

pub mod app;
pub mod config;
pub mod http;
pub mod route;
pub mod session;

pub use config::{ClientConfig, ConfigError, SourceKind};
pub use http::HttpProductSource;
pub use route::{Route, UnknownRoute};
pub use session::{SessionError, Storefront};
