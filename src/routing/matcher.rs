//! Route pattern compilation and path matching.
//!
//! # Responsibilities
//! - Compile `/`-separated patterns such as `/tasks/:id/complete`
//! - Match concrete request paths segment by segment
//! - Extract named parameters (percent-decoded)
//!
//! # Design Decisions
//! - Exact segment count, no wildcards, no optional segments
//! - Literal segments compared as plain strings (no regex)
//! - No trailing-slash normalization: `/tasks/` does not match `/tasks`
//! - Duplicate parameter names are rejected at compile time

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Marker that turns a segment into a named parameter.
const PARAM_MARKER: char = ':';

/// Parameters captured from a matched path, keyed by name.
pub type Params = HashMap<String, String>;

/// Error raised when a route pattern cannot be compiled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern `{0}` must start with `/`")]
    MissingLeadingSlash(String),
    #[error("pattern `{pattern}` has a parameter without a name")]
    EmptyParamName { pattern: String },
    #[error("pattern `{pattern}` declares parameter `{name}` more than once")]
    DuplicateParam { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Segments starting with `:` become named captures.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            match raw.strip_prefix(PARAM_MARKER) {
                Some("") => {
                    return Err(PatternError::EmptyParamName {
                        pattern: pattern.to_string(),
                    })
                }
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if duplicate {
                        return Err(PatternError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a concrete path, returning captured parameters on success.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }
        Some(params)
    }
}
