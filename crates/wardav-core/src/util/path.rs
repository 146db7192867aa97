//! Path normalization for area checks.
//!
//! ## Summary
//! Area comparisons always run on segment vectors, never on raw strings, so
//! `/alice2` can never be mistaken for a descendant of `/alice`. Normalizing
//! drops empty and `.` segments (which also strips trailing slashes) and
//! resolves `..`. A `..` that climbs above the root makes the path invalid.

use percent_encoding::percent_decode_str;

/// A normalized, slash-free sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct AreaPath {
    segments: Vec<String>,
}

impl AreaPath {
    /// ## Summary
    /// Normalizes a literal (already decoded) path.
    ///
    /// Returns `None` if `..` segments escape the root.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments: Vec<String> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(other.to_string()),
            }
        }
        Some(Self { segments })
    }

    /// ## Summary
    /// Percent-decodes a path taken from a request line or header, then normalizes it.
    ///
    /// Returns `None` if the decoded bytes are not UTF-8 or `..` escapes the root.
    #[must_use]
    pub fn parse_encoded(path: &str) -> Option<Self> {
        let decoded = percent_decode_str(path).decode_utf8().ok()?;
        Self::parse(&decoded)
    }

    /// Returns a new path with `other`'s segments appended.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns `true` if `prefix` is a whole-segment prefix of this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl std::fmt::Display for AreaPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
