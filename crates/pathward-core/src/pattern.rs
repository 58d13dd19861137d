//! # Pattern Compiler
//!
//! Compiles path patterns such as `users.*.posts.*` into [`Matcher`]s.
//!
//! - Segments are delimited by [`SEPARATOR`].
//! - A `*` segment captures exactly one non-empty path segment.
//! - Any other segment is a literal and must match exactly.
//! - There are no variable-length wildcards: a match requires the pattern and
//!   the path to have the same number of segments.
//! - The empty pattern matches only the empty path.
//!
//! Compilation is where malformed patterns are rejected, so registration
//! fails fast and evaluation never sees an invalid matcher.

use crate::PathwardError;
use std::fmt;

/// Path segment separator.
pub const SEPARATOR: char = '.';

/// Wildcard token; must occupy a whole segment.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture,
}

/// A compiled path pattern.
///
/// Pure and stateless: the same pattern text always compiles to an equal
/// `Matcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    source: String,
    segments: Vec<Segment>,
    captures: usize,
}

impl Matcher {
    /// The pattern text this matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Number of capture groups (wildcard segments).
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.captures
    }

    /// Whether `candidate` matches this pattern in full.
    #[must_use]
    pub fn test(&self, candidate: &str) -> bool {
        self.walk(candidate, |_| {})
    }

    /// Positional captures of `candidate`, left to right.
    ///
    /// Returns `None` when `candidate` does not match.
    #[must_use]
    pub fn extract<'a>(&self, candidate: &'a str) -> Option<Vec<&'a str>> {
        let mut captured = Vec::with_capacity(self.captures);
        self.walk(candidate, |part| captured.push(part))
            .then_some(captured)
    }

    fn walk<'a>(&self, candidate: &'a str, mut on_capture: impl FnMut(&'a str)) -> bool {
        if self.segments.is_empty() {
            return candidate.is_empty();
        }

        let mut parts = candidate.split(SEPARATOR);
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            match segment {
                Segment::Literal(literal) => {
                    if part != literal {
                        return false;
                    }
                }
                Segment::Capture => {
                    if part.is_empty() {
                        return false;
                    }
                    on_capture(part);
                }
            }
        }

        parts.next().is_none()
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Turns pattern text into [`Matcher`]s.
pub struct PatternCompiler;

impl PatternCompiler {
    /// Compile `pattern` into a matcher.
    ///
    /// Fails on empty segments (`a..b`, `.a`, `a.`) and on wildcards that
    /// share a segment with literal text (`a*`).
    pub fn compile(pattern: &str) -> Result<Matcher, PathwardError> {
        if pattern.is_empty() {
            return Ok(Matcher {
                source: String::new(),
                segments: Vec::new(),
                captures: 0,
            });
        }

        let mut segments = Vec::new();
        for (index, part) in pattern.split(SEPARATOR).enumerate() {
            if part.is_empty() {
                return Err(malformed(pattern, format!("empty segment at position {}", index)));
            }
            if part == WILDCARD {
                segments.push(Segment::Capture);
            } else if part.contains(WILDCARD) {
                return Err(malformed(
                    pattern,
                    format!("wildcard must occupy a whole segment, found '{}'", part),
                ));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        let captures = segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Capture))
            .count();

        Ok(Matcher {
            source: pattern.to_string(),
            segments,
            captures,
        })
    }
}

fn malformed(pattern: &str, reason: String) -> PathwardError {
    PathwardError::MalformedPattern {
        pattern: pattern.to_string(),
        reason,
    }
}

// =============================================================================
// TESTS
// =============================================================================
