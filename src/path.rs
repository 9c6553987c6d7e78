//! Slash-delimited folder paths.
//!
//! A path like `/Personal/Test` names a folder by the chain of folder names
//! leading to it. Empty segments are dropped, so leading, trailing and
//! doubled slashes are all tolerated. There is no escaping: a folder whose
//! name contains `/` cannot be addressed.

use std::fmt;

use crate::error::{NotedupError, Result};

/// A parsed folder path with at least one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(NotedupError::InvalidArgument(raw.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Location of a folder named `name` next to the one this path points at.
    pub fn sibling(&self, name: &str) -> String {
        let mut out = String::new();
        for segment in self.parent_segments() {
            out.push('/');
            out.push_str(segment);
        }
        out.push('/');
        out.push_str(name);
        out
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_path() {
        let path = FolderPath::parse("/A/B/C").unwrap();
        assert_eq!(path.segments(), ["A", "B", "C"]);
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        for raw in ["A/B/", "/A/B", "//A//B//"] {
            let path = FolderPath::parse(raw).unwrap();
            assert_eq!(path.segments(), ["A", "B"], "input {:?}", raw);
        }
    }

    #[test]
    fn test_parse_empty_is_invalid() {
        for raw in ["", "/", "///"] {
            match FolderPath::parse(raw) {
                Err(NotedupError::InvalidArgument(s)) => assert_eq!(s, raw),
                other => panic!("Expected InvalidArgument for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_names_keep_inner_whitespace() {
        let path = FolderPath::parse("/My Notes/ Drafts ").unwrap();
        assert_eq!(path.segments(), ["My Notes", " Drafts "]);
    }

    #[test]
    fn test_parent_segments() {
        let path = FolderPath::parse("/Personal/Projects/Test").unwrap();
        assert_eq!(path.parent_segments(), ["Personal", "Projects"]);
    }

    #[test]
    fn test_sibling_location() {
        let path = FolderPath::parse("Personal/Test").unwrap();
        assert_eq!(path.sibling("Test*"), "/Personal/Test*");

        let top = FolderPath::parse("/Test").unwrap();
        assert_eq!(top.sibling("Test*"), "/Test*");
    }

    #[test]
    fn test_display_normalizes() {
        let path = FolderPath::parse("//Work//Inbox/").unwrap();
        assert_eq!(path.to_string(), "/Work/Inbox");
    }
}
