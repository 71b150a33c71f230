use crate::models::{Role, RouteClass};
use std::sync::Arc;

/// Path every anonymous request outside the public list is sent to.
pub const LOGIN_PATH: &str = "/login";

/// Paths that send an authenticated caller straight to their dashboard.
pub const ROOT_PATHS: [&str; 2] = ["/", "/home"];

/// RouteTable
///
/// The five prefix lists the guard consults, kept as plain data so they can be
/// enumerated and overridden. Every entry is matched with `starts_with`, so `/admin`
/// also covers `/admin-dashboard` and `/administrator`.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    pub public: Vec<String>,
    pub admin: Vec<String>,
    pub tutor: Vec<String>,
    pub student: Vec<String>,
    pub common: Vec<String>,
}

/// RouteState
///
/// Shared, read-only handle on the table used by the guard middleware.
pub type RouteState = Arc<RouteTable>;

fn owned(prefixes: &[&str]) -> Vec<String> {
    prefixes.iter().map(|p| p.to_string()).collect()
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: owned(&[
                "/login",
                "/register",
                "/forgot-password",
                "/reset-password",
                "/auth",
            ]),
            admin: owned(&["/admin-dashboard", "/admin"]),
            tutor: owned(&["/tutor-dashboard", "/tutor", "/my-sessions", "/availability"]),
            student: owned(&["/dashboard", "/student", "/find-tutors", "/my-bookings"]),
            common: owned(&["/profile", "/settings", "/messages", "/notifications"]),
        }
    }
}

fn any_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

impl RouteTable {
    /// The classified tables in evaluation order. The order is the tie-breaker when a
    /// path matches more than one table.
    pub fn ordered(&self) -> [(RouteClass, &[String]); 4] {
        [
            (RouteClass::Admin, self.admin.as_slice()),
            (RouteClass::Tutor, self.tutor.as_slice()),
            (RouteClass::Student, self.student.as_slice()),
            (RouteClass::Common, self.common.as_slice()),
        ]
    }

    pub fn is_public(&self, path: &str) -> bool {
        any_prefix(&self.public, path)
    }

    /// classify
    ///
    /// Places `path` in exactly one bucket: the first table (admin, tutor, student,
    /// common) holding a matching prefix, or `Unmatched`.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.ordered()
            .into_iter()
            .find(|(_, prefixes)| any_prefix(prefixes, path))
            .map(|(class, _)| class)
            .unwrap_or(RouteClass::Unmatched)
    }

    /// overlaps
    ///
    /// Lists every prefix of one table that would also be claimed by another table,
    /// as `(prefix, owning table, other table)`. Classification still resolves these
    /// by evaluation order; the list only exists so startup can warn about them.
    pub fn overlaps(&self) -> Vec<(String, RouteClass, RouteClass)> {
        let tables = self.ordered();
        let mut found = Vec::new();

        for (owner, prefixes) in tables.iter() {
            for prefix in prefixes.iter() {
                for (other, other_prefixes) in tables.iter() {
                    // Either side being a prefix of the other means some path hits both.
                    let shared = any_prefix(other_prefixes, prefix)
                        || other_prefixes.iter().any(|o| o.starts_with(prefix.as_str()));
                    if other != owner && shared {
                        found.push((prefix.clone(), *owner, *other));
                    }
                }
            }
        }

        found
    }
}

/// The landing page for each role.
pub fn dashboard_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin-dashboard",
        Role::Tutor => "/tutor-dashboard",
        Role::Student => "/dashboard",
    }
}

pub fn is_root_path(path: &str) -> bool {
    ROOT_PATHS.contains(&path)
}
