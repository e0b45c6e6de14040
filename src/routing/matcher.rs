//! Path matching logic.
//!
//! # Responsibilities
//! - Match request paths exactly (`/sell`)
//! - Match path prefixes for subtrees (`/static/*`)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Exact patterns always beat prefixes; longer prefixes beat shorter ones
//! - No regex to guarantee O(n) matching

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches every path starting with the prefix (written `/prefix/*`).
    Prefix(String),
}

impl PathPattern {
    /// Compile a pattern. A trailing `*` turns it into a prefix match.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    /// Returns true if `path` falls under this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }

    /// Ordering key: exact patterns first, then longest prefix.
    pub(crate) fn specificity(&self) -> (u8, usize) {
        match self {
            PathPattern::Exact(exact) => (1, exact.len()),
            PathPattern::Prefix(prefix) => (0, prefix.len()),
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathPattern::Exact(exact) => f.write_str(exact),
            PathPattern::Prefix(prefix) => write!(f, "{}*", prefix),
        }
    }
}
