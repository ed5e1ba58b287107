//! Path pattern parsing and matching.
//!
//! Patterns are split on `/` into segments:
//!
//! - `users` matches the literal segment
//! - `:id` or `{id}` captures one segment under `id`
//! - `*` captures zero or more segments (unnamed wildcards are numbered
//!   `"0"`, `"1"`, ... in declaration order); `*rest` names the capture
//!
//! Empty segments are ignored on both sides, so `/users/` and `/users`
//! are the same pattern and match the same paths. Request segments are
//! percent-decoded one at a time before matching; an encoded `/` stays
//! inside its segment.

use std::borrow::Cow;

use crate::Params;

/// A single parsed segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly.
    Literal(String),
    /// A named single-segment capture.
    Param(String),
    /// A capture spanning zero or more segments.
    Wildcard(String),
}

/// A compiled path pattern.
///
/// # Example
///
/// ```rust
/// use orche_router::PathPattern;
///
/// let pattern = PathPattern::parse("/computers/:uuid");
/// let params = pattern.matches("/computers/42").unwrap();
/// assert_eq!(params.get("uuid"), Some("42"));
///
/// assert!(pattern.matches("/computers").is_none());
/// assert!(pattern.matches_prefix("/computers/42/parts").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern string.
    pub fn parse(pattern: &str) -> Self {
        let mut unnamed = 0usize;
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if s.starts_with('{') && s.ends_with('}') && s.len() > 2 {
                    Segment::Param(s[1..s.len() - 1].to_string())
                } else if let Some(name) = s.strip_prefix('*') {
                    if name.is_empty() {
                        let label = unnamed.to_string();
                        unnamed += 1;
                        Segment::Wildcard(label)
                    } else {
                        Segment::Wildcard(name.to_string())
                    }
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if the pattern has no segments (matches only `/`).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Matches the whole path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        self.run(path, false)
    }

    /// Matches a leading run of whole segments of `path`.
    ///
    /// `/computers` prefix-matches `/computers` and `/computers/42` but not
    /// `/computersx`.
    pub fn matches_prefix(&self, path: &str) -> Option<Params> {
        self.run(path, true)
    }

    fn run(&self, path: &str, prefix: bool) -> Option<Params> {
        let decoded: Vec<Cow<'_, str>> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();
        let parts: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let mut params = Params::new();
        match_segments(&self.segments, &parts, &mut params, prefix).then_some(params)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Invalid UTF-8 after decoding keeps the segment as received.
fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

fn match_segments(pattern: &[Segment], path: &[&str], params: &mut Params, prefix: bool) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return prefix || path.is_empty();
    };

    match head {
        Segment::Literal(expected) => match path.split_first() {
            Some((actual, tail)) if actual == expected => {
                match_segments(rest, tail, params, prefix)
            }
            _ => false,
        },
        Segment::Param(name) => match path.split_first() {
            Some((actual, tail)) => {
                let mark = params.len();
                params.push(name.clone(), *actual);
                if match_segments(rest, tail, params, prefix) {
                    true
                } else {
                    params.truncate(mark);
                    false
                }
            }
            None => false,
        },
        Segment::Wildcard(name) => {
            // Greedy: prefer the longest capture that still lets the rest match.
            for take in (0..=path.len()).rev() {
                let mark = params.len();
                params.push(name.clone(), path[..take].join("/"));
                if match_segments(rest, &path[take..], params, prefix) {
                    return true;
                }
                params.truncate(mark);
            }
            false
        }
    }
}
