use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role as reported by the auth service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Full name when known, otherwise the email
    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// A stored token together with the user it was verified for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Application routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
    Admin,
    NotFound,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Admin => "/admin",
            Route::NotFound => "*",
        }
    }

    pub fn from_path(path: &str) -> Route {
        match path {
            "/" => Route::Dashboard,
            "/login" => Route::Login,
            "/admin" => Route::Admin,
            _ => Route::NotFound,
        }
    }
}

/// Outcome of a route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

/// Decide whether `route` may be shown for `session`.
///
/// The login page and the not-found page are public. Everything else needs a
/// session, and the admin page additionally needs the admin role.
pub fn guard(route: Route, session: Option<&Session>) -> Access {
    match (route, session) {
        (Route::Login | Route::NotFound, _) => Access::Allow,
        (_, None) => Access::Redirect(Route::Login),
        (Route::Admin, Some(s)) if !s.user.is_admin() => Access::Redirect(Route::Dashboard),
        _ => Access::Allow,
    }
}
