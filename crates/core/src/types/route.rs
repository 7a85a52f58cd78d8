//! Front-end routes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A view the dashboard can navigate to.
///
/// Every route except [`Route::Login`] sits behind the route access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Table,
    Dashboard,
    AddressForm,
    Login,
}

impl Route {
    /// Route shown for the bare `/` path.
    pub const HOME: Self = Self::Table;

    /// The URL path of this route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Table => "/table",
            Self::Dashboard => "/dashboard",
            Self::AddressForm => "/address-form",
            Self::Login => "/login",
        }
    }

    /// Whether navigation to this route must pass the access gate.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Resolve a URL path against the route table.
    ///
    /// `/` redirects to [`Route::HOME`]; unknown paths fall through to the
    /// login route. Query strings, fragments and trailing slashes are ignored.
    ///
    /// ```
    /// use little_sun_core::Route;
    ///
    /// assert_eq!(Route::resolve("/"), Route::Table);
    /// assert_eq!(Route::resolve("/dashboard/"), Route::Dashboard);
    /// assert_eq!(Route::resolve("/nowhere"), Route::Login);
    /// ```
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        match path {
            "" => Self::HOME,
            "/table" => Self::Table,
            "/dashboard" => Self::Dashboard,
            "/address-form" => Self::AddressForm,
            _ => Self::Login,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
