//! Field paths for addressing within records
//!
//! Provides [`FieldPath`] for hierarchical addressing of fields inside a
//! node record.
//!
//! # Text form
//!
//! Segments are joined with `.`. A segment may contain any character; the
//! reserved characters `\`, `.` and `:` are written with a leading `\`, so
//! the text form is injective:
//!
//! - `["metadata", "name"]` → `metadata.name`
//! - `["metadata", "labels", "app.kubernetes.io/name"]` →
//!   `metadata.labels.app\.kubernetes\.io/name`
//!
//! Segments that parse as unsigned integers index into arrays when the
//! path is resolved against a record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between path segments
pub const SEGMENT_SEPARATOR: char = '.';

/// Escape character for reserved characters inside a segment
pub const ESCAPE: char = '\\';

/// Characters that must be escaped inside a segment or a handle component
pub(crate) const RESERVED: [char; 3] = [ESCAPE, SEGMENT_SEPARATOR, ':'];

/// Path within a record tree
///
/// # Examples
/// - `["spec", "selector", "app"]` → `spec.selector.app`
/// - `["spec", "ports", "0", "port"]` → `spec.ports.0.port`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from segments
    ///
    /// # Errors
    /// Returns error if any segment is empty
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment);
        }
        Ok(Self(segments))
    }

    /// Create path from a single segment
    ///
    /// # Errors
    /// Returns error if the segment is empty
    #[inline]
    pub fn single(segment: impl Into<String>) -> Result<Self, PathError> {
        Self::new(vec![segment.into()])
    }

    /// Empty path (the record itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    ///
    /// # Errors
    /// Returns error if the segment is empty
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        if segment.is_empty() {
            return Err(PathError::EmptySegment);
        }
        let mut new = self.clone();
        new.0.push(segment);
        Ok(new)
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `spec.template` is prefix of `spec.template.spec`
    /// - `spec.template` is NOT prefix of `spec.selector`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if paths overlap (one is prefix of other)
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Human-readable form with unescaped segments, for labels only
    #[must_use]
    pub fn display_label(&self) -> String {
        self.0.join(".")
    }
}

/// Write `raw` with reserved characters escaped
pub(crate) fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        if RESERVED.contains(&c) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// Split escaped text on every unescaped `separator`
///
/// Returned pieces are still escaped. A trailing lone escape is an error.
pub(crate) fn split_unescaped(text: &str, separator: char) -> Result<Vec<&str>, PathError> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == separator {
            pieces.push(&text[start..idx]);
            start = idx + c.len_utf8();
        }
    }
    if escaped {
        return Err(PathError::DanglingEscape);
    }
    pieces.push(&text[start..]);
    Ok(pieces)
}

/// Remove escapes from one component; unescaped reserved characters are rejected
pub(crate) fn unescape(piece: &str) -> Result<String, PathError> {
    let mut out = String::with_capacity(piece.len());
    let mut chars = piece.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next() {
                Some(next) if RESERVED.contains(&next) => out.push(next),
                Some(next) => return Err(PathError::InvalidEscape(next)),
                None => return Err(PathError::DanglingEscape),
            }
        } else if RESERVED.contains(&c) {
            return Err(PathError::UnescapedReserved(c));
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(SEGMENT_SEPARATOR);
            }
            escape_into(&mut out, segment);
        }
        f.write_str(&out)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = split_unescaped(s, SEGMENT_SEPARATOR)?
            .into_iter()
            .map(|piece| {
                if piece.is_empty() {
                    Err(PathError::EmptySegment)
                } else {
                    unescape(piece)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<Vec<String>> for FieldPath {
    type Error = PathError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl Default for FieldPath {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Escape character at end of input
    #[error("dangling escape at end of path")]
    DanglingEscape,

    /// Escape followed by a non-reserved character
    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char),

    /// Reserved character without escape
    #[error("reserved character '{0}' must be escaped")]
    UnescapedReserved(char),
}
