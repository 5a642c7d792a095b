//! Relative paths inside a mount point
//!
//! Provides [`RelPath`], the POSIX-style relative path every resolver works
//! with, together with the containment helpers that keep resolved paths
//! inside their mount point, space or workflow.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

const PARENT: &str = "..";
const CURRENT: &str = ".";

/// Relative path below a mount point root
///
/// Segments are stored decoded. `..` segments survive decoding so that
/// [`RelPath::leaves_scope`] can see them; [`RelPath::normalize`] folds them.
///
/// # Examples
/// - `Users/john/Private/workflow` → `["Users", "john", "Private", "workflow"]`
/// - `../other/data/x.csv` → `["..", "other", "data", "x.csv"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RelPath(Vec<String>);

impl RelPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (mount point root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Decode the path component of a URL
    ///
    /// Percent-decodes, strips the leading slash and drops empty and `.`
    /// segments. `..` segments are kept verbatim.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let decoded = percent_decode_str(raw).decode_utf8_lossy();
        Self::parse(&decoded)
    }

    /// Split an already decoded POSIX path (leading slash optional)
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|seg| !seg.is_empty() && *seg != CURRENT)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Convert a relative local path into segments
    ///
    /// # Errors
    /// Returns error if the path has a root or a drive prefix
    pub fn from_local(path: &Path) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(seg) => segments.push(seg.to_string_lossy().into_owned()),
                Component::ParentDir => segments.push(PARENT.to_string()),
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PathError::NotRelative(path.display().to_string()));
                }
            }
        }
        Ok(Self(segments))
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

    /// Get first segment (if not root)
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether the path explicitly asks to leave its scope
    ///
    /// True iff the first segment is literally `..`. Purely syntactic: the
    /// path is not normalized first, so `a/../../b` does not leave scope.
    #[inline]
    #[must_use]
    pub fn leaves_scope(&self) -> bool {
        self.first() == Some(PARENT)
    }

    /// Whether this is a Hub item-id reference (`*<id>`)
    #[inline]
    #[must_use]
    pub fn is_item_id(&self) -> bool {
        self.0.len() == 1 && self.0[0].starts_with('*')
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Concatenate two paths without normalizing
    #[must_use]
    pub fn join(&self, suffix: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(suffix.0.iter().cloned());
        new
    }

    /// Fold `.` and `..` segments
    ///
    /// `..` segments that would climb above the start are kept, so a
    /// normalized path escapes its origin iff it still starts with `..`.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mut out: Vec<String> = Vec::with_capacity(self.0.len());
        for seg in &self.0 {
            match seg.as_str() {
                CURRENT => {}
                PARENT => match out.last() {
                    Some(last) if last != PARENT => {
                        out.pop();
                    }
                    _ => out.push(PARENT.to_string()),
                },
                _ => out.push(seg.clone()),
            }
        }
        Self(out)
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if this path starts with `prefix`
    #[inline]
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        prefix.is_prefix_of(self)
    }

    /// Remove `prefix`, returning the remainder
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        self.starts_with(prefix)
            .then(|| Self(self.0[prefix.0.len()..].to_vec()))
    }

    /// Path from `base` to `self`, using `..` to climb out of `base`
    ///
    /// Both paths are expected to be normalized.
    #[must_use]
    pub fn relative_to(&self, base: &Self) -> Self {
        let common = self
            .0
            .iter()
            .zip(&base.0)
            .take_while(|(a, b)| a == b)
            .count();
        let mut segments: Vec<String> = std::iter::repeat(PARENT.to_string())
            .take(base.0.len() - common)
            .collect();
        segments.extend(self.0[common..].iter().cloned());
        Self(segments)
    }

    /// Append `suffix` to `self` and require the result to stay inside `self`
    ///
    /// # Errors
    /// Returns [`PathError::Escapes`] if the normalized result leaves `self`
    pub fn append_and_contain(&self, suffix: &Self) -> Result<Self, PathError> {
        self.append_within(suffix, self)
    }

    /// Append `suffix` to `self` and require the result to stay inside `boundary`
    ///
    /// Used when a path deliberately leaves a narrow scope to enter a wider
    /// one, e.g. from the workflow into its space.
    ///
    /// # Errors
    /// Returns [`PathError::Escapes`] if the normalized result leaves `boundary`
    pub fn append_within(&self, suffix: &Self, boundary: &Self) -> Result<Self, PathError> {
        let joined = self.join(suffix).normalize();
        if joined.leaves_scope() || !joined.starts_with(boundary) {
            return Err(PathError::Escapes {
                path: joined.to_string(),
                boundary: boundary.to_string(),
            });
        }
        Ok(joined)
    }

    /// Resolve against a local directory
    #[must_use]
    pub fn to_local(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(self.iter());
        path
    }
}

impl Display for RelPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl serde::Serialize for RelPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for RelPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

impl From<&str> for RelPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<Vec<String>> for RelPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// Errors related to relative paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Normalized path left its permitted root
    #[error("'{path}' is not in '{boundary}'")]
    Escapes {
        /// Offending normalized path
        path: String,
        /// Root the path had to stay in
        boundary: String,
    },

    /// Local path is absolute
    #[error("'{0}' is not a relative path")]
    NotRelative(String),
}
