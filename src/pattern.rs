use crate::types::RouteParams;
use crate::Error;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

lazy_static! {
    static ref PARAM_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

const CATCH_ALL_DEFAULT_NAME: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    // Literal beats param beats catch-all at the same depth.
    fn weight(&self) -> u8 {
        match self {
            Segment::Literal(_) => 2,
            Segment::Param(_) => 1,
            Segment::CatchAll(_) => 0,
        }
    }

    fn capture_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

/// A parsed route path.
///
/// Segments are separated by `/`. A segment starting with `:` captures one path segment under that
/// name, a last segment starting with `*` captures all the remaining segments (possibly none) joined
/// by `/`. A bare `*` is captured under the name `*`.
///
/// # Examples
///
/// ```
/// use ranger::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:userId/files/*path").unwrap();
/// let params = pattern.match_path("/users/42/files/docs/cv.pdf").unwrap();
///
/// assert_eq!(params.get("userId").unwrap(), "42");
/// assert_eq!(params.get("path").unwrap(), "docs/cv.pdf");
/// assert!(pattern.match_path("/users/42").is_some());
/// assert!(pattern.match_path("/books/42/files").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a route path. An empty path is the root, same as `/`.
    pub fn parse<P: AsRef<str>>(path: P) -> crate::Result<PathPattern> {
        let path = path.as_ref();
        let invalid = |reason: &str| Error::InvalidPattern {
            pattern: path.to_owned(),
            reason: reason.to_owned(),
        };

        if !path.is_empty() && !path.starts_with('/') {
            return Err(invalid("a route path must start with '/'"));
        }

        let raw_segments = path.split('/').filter(|seg| !seg.is_empty()).collect::<Vec<_>>();
        let mut segments = Vec::with_capacity(raw_segments.len());

        for (idx, raw) in raw_segments.iter().enumerate() {
            let segment = if let Some(name) = raw.strip_prefix(':') {
                if !PARAM_NAME_RE.is_match(name) {
                    return Err(invalid(&format!("invalid parameter name {:?}", name)));
                }
                Segment::Param(name.to_owned())
            } else if let Some(name) = raw.strip_prefix('*') {
                if idx != raw_segments.len() - 1 {
                    return Err(invalid("a catch-all segment must be the last segment"));
                }
                if name.is_empty() {
                    Segment::CatchAll(CATCH_ALL_DEFAULT_NAME.to_owned())
                } else if PARAM_NAME_RE.is_match(name) {
                    Segment::CatchAll(name.to_owned())
                } else {
                    return Err(invalid(&format!("invalid catch-all name {:?}", name)));
                }
            } else {
                Segment::Literal((*raw).to_owned())
            };

            if let Some(name) = segment.capture_name() {
                if segments.iter().any(|s: &Segment| s.capture_name() == Some(name)) {
                    return Err(invalid(&format!("duplicate parameter name {:?}", name)));
                }
            }

            segments.push(segment);
        }

        Ok(PathPattern { segments })
    }

    /// Appends `other` to this pattern, as happens when a router is mounted under a prefix.
    pub fn join(&self, other: &PathPattern) -> crate::Result<PathPattern> {
        if self.has_catch_all() && !other.segments.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: format!("{}{}", self, other),
                reason: "a catch-all segment must be the last segment".to_owned(),
            });
        }

        let joined = PathPattern {
            segments: self.segments.iter().chain(other.segments.iter()).cloned().collect(),
        };

        // Re-parse to catch parameter names repeated across prefix and route.
        PathPattern::parse(joined.to_string())
    }

    /// Matches a concrete request path, returning the captured parameters.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let segments = path.split('/').filter(|seg| !seg.is_empty()).collect::<Vec<_>>();
        self.match_segments(&segments)
    }

    /// Matches already split (and decoded) request path segments.
    pub(crate) fn match_segments<S: AsRef<str>>(&self, path: &[S]) -> Option<RouteParams> {
        let catch_all = self.has_catch_all();
        let fixed = if catch_all { self.segments.len() - 1 } else { self.segments.len() };

        if (!catch_all && path.len() != fixed) || path.len() < fixed {
            return None;
        }

        let mut params = RouteParams::new();
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if path[idx].as_ref() != lit.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => params.set(name.as_str(), path[idx].as_ref()),
                Segment::CatchAll(name) => {
                    let rest = path[idx..].iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join("/");
                    params.set(name.as_str(), rest);
                }
            }
        }

        Some(params)
    }

    /// Returns `true` when every segment of this pattern matches the beginning of `path`.
    pub(crate) fn match_prefix<S: AsRef<str>>(&self, path: &[S]) -> bool {
        if self.has_catch_all() {
            return self.match_segments(path).is_some();
        }

        self.segments.len() <= path.len()
            && self.segments.iter().zip(path).all(|(segment, val)| match segment {
                Segment::Literal(lit) => val.as_ref() == lit.as_str(),
                _ => true,
            })
    }

    /// Orders two patterns matching the same path by specificity.
    pub(crate) fn cmp_specificity(&self, other: &PathPattern) -> Ordering {
        self.weights().cmp(other.weights())
    }

    // A pattern without a catch-all ends with an extra weight so that `/foo` outranks `/foo/*rest`.
    fn weights(&self) -> impl Iterator<Item = u8> + '_ {
        let end = if self.has_catch_all() { None } else { Some(1) };
        self.segments.iter().map(Segment::weight).chain(end)
    }

    /// The pattern with parameter names erased; two routes with the same key can never be told apart.
    pub(crate) fn key(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_owned();
        }

        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(lit) => format!("/{}", lit),
                Segment::Param(_) => "/:".to_owned(),
                Segment::CatchAll(_) => "/*".to_owned(),
            })
            .collect()
    }

    pub(crate) fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => write!(f, "/{}", lit)?,
                Segment::Param(name) => write!(f, "/:{}", name)?,
                Segment::CatchAll(name) if name == CATCH_ALL_DEFAULT_NAME => write!(f, "/*")?,
                Segment::CatchAll(name) => write!(f, "/*{}", name)?,
            }
        }
        Ok(())
    }
}
