//! Route matching logic.
//!
//! # Responsibilities
//! - Match request path against a literal prefix (case-sensitive)
//! - Match request path against an anchored regular expression
//! - Report how much of the path was matched so it can be stripped
//!
//! # Design Decisions
//! - A pattern starting with `^` is a regex, anything else is a literal prefix
//! - Literal prefixes use plain `starts_with`; `/api` also matches `/apiv2`
//! - Regex matches only count when they begin at the start of the path

use regex::Regex;

/// Trait for matching request paths against a rule's pattern.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the byte length of the matched leading part of `path`,
    /// or `None` if the path does not match.
    fn match_prefix(&self, path: &str) -> Option<usize>;

    /// The pattern as written in configuration.
    fn pattern(&self) -> &str;
}

/// Matches a literal path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn match_prefix(&self, path: &str) -> Option<usize> {
        path.starts_with(&self.prefix).then_some(self.prefix.len())
    }

    fn pattern(&self) -> &str {
        &self.prefix
    }
}

/// Matches a regular expression anchored at the start of the path.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compile a regex matcher.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl Matcher for RegexMatcher {
    fn match_prefix(&self, path: &str) -> Option<usize> {
        self.regex
            .find(path)
            .filter(|m| m.start() == 0)
            .map(|m| m.end())
    }

    fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// Returns true if the configured pattern is a regular expression.
pub fn is_regex_pattern(pattern: &str) -> bool {
    pattern.starts_with('^')
}

/// Build the matcher for a configured pattern.
pub fn compile(pattern: &str) -> Result<Box<dyn Matcher>, regex::Error> {
    if is_regex_pattern(pattern) {
        Ok(Box::new(RegexMatcher::new(pattern)?))
    } else {
        Ok(Box::new(PathPrefixMatcher::new(pattern)))
    }
}
