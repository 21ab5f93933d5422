use std::fmt;
use std::str::FromStr;

use storefront_catalog::FilterMode;

/// Top-level pages of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Sales,
    Cart,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no route for path {0:?}")]
pub struct UnknownRoute(pub String);

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Sales => "/sales",
            Route::Cart => "/cart",
            Route::Register => "/register",
        }
    }

    /// The catalog filter this page shows, if it shows the catalog at all.
    pub fn filter_mode(self) -> Option<FilterMode> {
        match self {
            Route::Home => Some(FilterMode::All),
            Route::Sales => Some(FilterMode::OnSale),
            Route::Cart | Route::Register => None,
        }
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    /// Accepts the path with or without a leading or trailing slash, ignoring
    /// any query string or fragment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split(['?', '#']).next().unwrap_or_default();
        match path.trim().trim_matches('/').to_ascii_lowercase().as_str() {
            "" => Ok(Route::Home),
            "sales" => Ok(Route::Sales),
            "cart" => Ok(Route::Cart),
            "register" => Ok(Route::Register),
            _ => Err(UnknownRoute(s.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
