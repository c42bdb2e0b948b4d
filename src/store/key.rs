//! Typed keys for cacheable units.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Hierarchical identifier of one cacheable unit, e.g. `posts/posts_3` or
/// `highlights/<title>`.
///
/// A key is an ordered sequence of sanitized path segments. The last segment
/// is the leaf; snapshot files for the key live in the directory formed by
/// the preceding segments and carry the leaf as their filename prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalKey {
    segments: Vec<String>,
}

impl LogicalKey {
    /// Create a single-segment key.
    pub fn new(segment: &str) -> Result<Self> {
        Ok(Self {
            segments: vec![sanitize_segment(segment)?],
        })
    }

    /// Extend the key with one more segment.
    pub fn child(&self, segment: &str) -> Result<Self> {
        let mut segments = self.segments.clone();
        segments.push(sanitize_segment(segment)?);
        Ok(Self { segments })
    }

    /// Key for page `index` of a paged category: `<category>/<category>_<index>`.
    pub fn page(category: &str, index: usize) -> Result<Self> {
        Self::new(category)?.child(&format!("{}_{}", category, index))
    }

    /// The final segment, used as the snapshot filename prefix.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Directory holding this key's snapshots, relative to the store root.
    pub fn dir(&self) -> PathBuf {
        self.segments[..self.segments.len().saturating_sub(1)]
            .iter()
            .collect()
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Make an arbitrary string (e.g. a highlight title) safe as a single path
/// segment. Traversal and empty names are rejected, problematic characters
/// are replaced.
pub fn sanitize_segment(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidSegment(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidSegment(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidSegment(
            "Segment cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key_layout() {
        let key = LogicalKey::page("posts", 3).unwrap();
        assert_eq!(key.to_string(), "posts/posts_3");
        assert_eq!(key.leaf(), "posts_3");
        assert_eq!(key.dir(), PathBuf::from("posts"));
    }

    #[test]
    fn test_single_segment_key_has_empty_dir() {
        let key = LogicalKey::new("user_info").unwrap();
        assert_eq!(key.leaf(), "user_info");
        assert_eq!(key.dir(), PathBuf::new());
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_segment("my/title").unwrap(), "my_title");
        assert_eq!(sanitize_segment("a:b?c").unwrap(), "a_b_c");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_segment("../escape").is_err());
        assert!(sanitize_segment("   ").is_err());
    }
}
