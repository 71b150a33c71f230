use crate::route_table::{ROOT_PATHS, RouteTable};

const SUBTREE_SUFFIX: &str = "/:path*";

/// Reads a segment as `.` or `..`, also in percent-encoded spellings (`%2e`, `.%2E`).
fn dot_segment(segment: &str) -> Option<usize> {
    match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
        "." => Some(1),
        ".." => Some(2),
        _ => None,
    }
}

/// normalize_path
///
/// Resolves `.` and `..` segments (plain or percent-encoded) the way the upstream URL
/// parser will, so the guard decides on the path the front end actually receives.
/// Backslashes count as separators. Other segments are kept byte for byte.
pub fn normalize_path(path: &str) -> String {
    let raw = path.strip_prefix('/').unwrap_or(path);
    let segments: Vec<&str> = raw.split(['/', '\\']).collect();
    let last = segments.len().saturating_sub(1);
    let mut kept: Vec<&str> = Vec::with_capacity(segments.len());

    for (index, segment) in segments.into_iter().enumerate() {
        match dot_segment(segment) {
            Some(dots) => {
                if dots == 2 {
                    kept.pop();
                }
                // A trailing dot segment leaves a directory path behind.
                if index == last {
                    kept.push("");
                }
            }
            None => kept.push(segment),
        }
    }

    format!("/{}", kept.join("/"))
}

/// PathPattern
///
/// One entry of the activation list. `/home` matches only itself; `/admin/:path*`
/// matches `/admin` and anything below it, segment-aware (not `/administrator`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix(SUBTREE_SUFFIX) {
            Some(base) => PathPattern::Subtree(base.to_string()),
            None => PathPattern::Exact(raw.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Subtree(base) => path
                .strip_prefix(base.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// ActivationPattern
///
/// Decides whether the guard runs for a request at all. Requests outside the pattern
/// are forwarded without a session lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPattern {
    patterns: Vec<PathPattern>,
}

impl ActivationPattern {
    /// from_table
    ///
    /// Builds the default activation list: every admin, tutor, student and common
    /// prefix as a subtree pattern, plus `/` and `/home` when `include_root` is set.
    pub fn from_table(table: &RouteTable, include_root: bool) -> Self {
        let mut patterns: Vec<PathPattern> = table
            .ordered()
            .into_iter()
            .flat_map(|(_, prefixes)| prefixes.iter())
            .map(|prefix| PathPattern::Subtree(prefix.clone()))
            .collect();

        if include_root {
            patterns.extend(ROOT_PATHS.iter().map(|p| PathPattern::Exact(p.to_string())));
        }

        Self { patterns }
    }

    pub fn from_patterns<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: raw
                .into_iter()
                .map(|p| PathPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}
