//! `knime://` URLs and their classification
//!
//! The authority alone decides how a URL is resolved: four reserved markers
//! select a relative category, anything else is the id of a mount point.
//!
//! The input side is parsed by hand rather than with [`url::Url`], which
//! would fold `..` segments and lose the leave-scope marker.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::encode::{encode_path, AUTHORITY, MARKER_LOOKALIKE};
use crate::error::ResolutionError;
use crate::path::RelPath;
use crate::version::{ItemVersion, VERSION_PARAM};

/// URL scheme handled by the resolvers
pub const SCHEME: &str = "knime";

/// Authority of mountpoint-relative URLs
pub const MOUNTPOINT_AUTHORITY: &str = "knime.mountpoint";

/// Authority of space-relative URLs
pub const SPACE_AUTHORITY: &str = "knime.space";

/// Authority of workflow-relative URLs
pub const WORKFLOW_AUTHORITY: &str = "knime.workflow";

/// Authority of node-relative URLs
pub const NODE_AUTHORITY: &str = "knime.node";

/// How a `knime://` URL is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlCategory {
    /// Authority is an explicit mount id
    MountpointAbsolute,
    /// Relative to the current mount point (`knime.mountpoint`)
    MountpointRelative,
    /// Relative to the current Hub space (`knime.space`)
    HubSpaceRelative,
    /// Relative to the current workflow (`knime.workflow`)
    WorkflowRelative,
    /// Relative to the current node (`knime.node`)
    NodeRelative,
}

impl UrlCategory {
    /// All categories, absolute first
    pub const ALL: [Self; 5] = [
        Self::MountpointAbsolute,
        Self::MountpointRelative,
        Self::HubSpaceRelative,
        Self::WorkflowRelative,
        Self::NodeRelative,
    ];

    /// Category selected by an authority; matched verbatim
    #[must_use]
    pub fn from_authority(authority: &str) -> Self {
        match authority {
            MOUNTPOINT_AUTHORITY => Self::MountpointRelative,
            SPACE_AUTHORITY => Self::HubSpaceRelative,
            WORKFLOW_AUTHORITY => Self::WorkflowRelative,
            NODE_AUTHORITY => Self::NodeRelative,
            _ => Self::MountpointAbsolute,
        }
    }

    /// Reserved authority, `None` for mountpoint-absolute URLs
    #[must_use]
    pub fn authority(self) -> Option<&'static str> {
        match self {
            Self::MountpointAbsolute => None,
            Self::MountpointRelative => Some(MOUNTPOINT_AUTHORITY),
            Self::HubSpaceRelative => Some(SPACE_AUTHORITY),
            Self::WorkflowRelative => Some(WORKFLOW_AUTHORITY),
            Self::NodeRelative => Some(NODE_AUTHORITY),
        }
    }

    /// Check for one of the relative categories
    #[inline]
    #[must_use]
    pub fn is_relative(self) -> bool {
        self != Self::MountpointAbsolute
    }
}

impl Display for UrlCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MountpointAbsolute => "mountpoint absolute",
            Self::MountpointRelative => "mountpoint relative",
            Self::HubSpaceRelative => "space relative",
            Self::WorkflowRelative => "workflow relative",
            Self::NodeRelative => "node relative",
        })
    }
}

/// Parsed `knime://` URL
///
/// The path is kept decoded and unnormalized; fragments are dropped and the
/// only query parameter retained is the item version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KnimeUrl {
    authority: String,
    category: UrlCategory,
    path: RelPath,
    version: Option<ItemVersion>,
}

impl KnimeUrl {
    /// Create from parts
    ///
    /// [`ItemVersion::CurrentState`] is stored as no version.
    #[must_use]
    pub fn new(authority: impl Into<String>, path: RelPath, version: Option<ItemVersion>) -> Self {
        let authority = authority.into();
        let category = UrlCategory::from_authority(&authority);
        Self::with_category(authority, category, path, version)
    }

    fn with_category(
        authority: String,
        category: UrlCategory,
        path: RelPath,
        version: Option<ItemVersion>,
    ) -> Self {
        Self {
            authority,
            category,
            path,
            version: version.filter(|v| !v.is_current_state()),
        }
    }

    /// `knime://<mount_id>/<path>`
    ///
    /// A mount id spelled like a reserved marker stays a mount id.
    #[inline]
    #[must_use]
    pub fn mountpoint_absolute(
        mount_id: impl Into<String>,
        path: RelPath,
        version: Option<ItemVersion>,
    ) -> Self {
        Self::with_category(mount_id.into(), UrlCategory::MountpointAbsolute, path, version)
    }

    /// `knime://knime.mountpoint/<path>`
    #[inline]
    #[must_use]
    pub fn mountpoint_relative(path: RelPath, version: Option<ItemVersion>) -> Self {
        Self::new(MOUNTPOINT_AUTHORITY, path, version)
    }

    /// `knime://knime.space/<path>`
    #[inline]
    #[must_use]
    pub fn space_relative(path: RelPath, version: Option<ItemVersion>) -> Self {
        Self::new(SPACE_AUTHORITY, path, version)
    }

    /// `knime://knime.workflow/<path>`
    #[inline]
    #[must_use]
    pub fn workflow_relative(path: RelPath, version: Option<ItemVersion>) -> Self {
        Self::new(WORKFLOW_AUTHORITY, path, version)
    }

    /// `knime://knime.node/<path>`
    #[inline]
    #[must_use]
    pub fn node_relative(path: RelPath) -> Self {
        Self::new(NODE_AUTHORITY, path, None)
    }

    /// Parse a `knime://` URL
    ///
    /// # Errors
    /// - [`ResolutionError::NotAKnimeUrl`] for any other scheme
    /// - [`ResolutionError::UnrecognizedUrl`] if the authority is missing
    pub fn parse(input: &str) -> Result<Self, ResolutionError> {
        let unrecognized = |reason: &str| ResolutionError::UnrecognizedUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        let Some((scheme, rest)) = input.trim().split_once(':') else {
            return Err(ResolutionError::NotAKnimeUrl {
                url: input.to_string(),
            });
        };
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return Err(ResolutionError::NotAKnimeUrl {
                url: input.to_string(),
            });
        }
        let rest = rest
            .strip_prefix("//")
            .ok_or_else(|| unrecognized("missing authority"))?;

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let (rest, query) = match rest.split_once('?') {
            Some((before, query)) => (before, Some(query)),
            None => (rest, None),
        };
        let (authority, raw_path) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));

        if authority.is_empty() {
            return Err(unrecognized("missing authority"));
        }
        let path = RelPath::decode(raw_path);
        let version = query.and_then(ItemVersion::from_query);

        // markers are matched on the raw text, only mount ids are decoded
        let category = UrlCategory::from_authority(authority);
        if category.is_relative() {
            return Ok(Self::with_category(authority.to_string(), category, path, version));
        }
        let mount_id = percent_decode_str(authority).decode_utf8_lossy();
        if mount_id.contains(['@', ':']) {
            return Err(unrecognized("user info and ports are not allowed"));
        }
        Ok(Self::mountpoint_absolute(mount_id.into_owned(), path, version))
    }

    /// Authority (reserved marker or mount id)
    #[inline]
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Category implied by the authority
    #[inline]
    #[must_use]
    pub fn category(&self) -> UrlCategory {
        self.category
    }

    /// Mount id for mountpoint-absolute URLs
    #[inline]
    #[must_use]
    pub fn mount_id(&self) -> Option<&str> {
        (self.category() == UrlCategory::MountpointAbsolute).then_some(self.authority.as_str())
    }

    /// Decoded, unnormalized path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &RelPath {
        &self.path
    }

    /// Requested item version
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&ItemVersion> {
        self.version.as_ref()
    }

    /// Same URL with another version
    #[must_use]
    pub fn with_version(mut self, version: Option<ItemVersion>) -> Self {
        self.version = version.filter(|v| !v.is_current_state());
        self
    }

    /// Convert to a [`Url`]
    ///
    /// # Errors
    /// Returns [`ResolutionError::UnrecognizedUrl`] if the authority is not a
    /// valid host
    pub fn to_url(&self) -> Result<Url, ResolutionError> {
        let text = self.to_string();
        Url::parse(&text).map_err(|e| ResolutionError::UnrecognizedUrl {
            url: text,
            reason: e.to_string(),
        })
    }
}

impl Display for KnimeUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let escape = if self.category == UrlCategory::from_authority(&self.authority) {
            AUTHORITY
        } else {
            MARKER_LOOKALIKE
        };
        write!(
            f,
            "{SCHEME}://{}",
            utf8_percent_encode(&self.authority, escape)
        )?;
        if !self.path.is_empty() {
            write!(f, "/{}", encode_path(&self.path))?;
        }
        if let Some(value) = self.version.and_then(|v| v.query_value()) {
            write!(f, "?{VERSION_PARAM}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for KnimeUrl {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for KnimeUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KnimeUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Classify a URL into category, decoded path and item version
///
/// # Errors
/// Same as [`KnimeUrl::parse`]
pub fn classify(url: &str) -> Result<(UrlCategory, RelPath, Option<ItemVersion>), ResolutionError> {
    let url = KnimeUrl::parse(url)?;
    Ok((url.category(), url.path, url.version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_reserved_authorities() {
        let cases = [
            ("knime://knime.mountpoint/a", UrlCategory::MountpointRelative),
            ("knime://knime.space/a", UrlCategory::HubSpaceRelative),
            ("knime://knime.workflow/a", UrlCategory::WorkflowRelative),
            ("knime://knime.node/a", UrlCategory::NodeRelative),
            ("knime://My-Hub/a", UrlCategory::MountpointAbsolute),
            ("knime://LOCAL/a", UrlCategory::MountpointAbsolute),
        ];
        for (url, expected) in cases {
            assert_eq!(classify(url).unwrap().0, expected, "{url}");
        }
    }

    #[test]
    fn authority_matched_verbatim() {
        let (category, _, _) = classify("knime://KNIME.WORKFLOW/a").unwrap();
        assert_eq!(category, UrlCategory::MountpointAbsolute);
    }

    #[test]
    fn encoded_marker_is_a_mount_id() {
        let url = KnimeUrl::parse("knime://knime%2Eworkflow/x").unwrap();
        assert_eq!(url.category(), UrlCategory::MountpointAbsolute);
        assert_eq!(url.mount_id(), Some("knime.workflow"));
        assert_eq!(url.to_string(), "knime://knime%2Eworkflow/x");
        assert_eq!(KnimeUrl::parse(&url.to_string()).unwrap(), url);

        let url = KnimeUrl::parse("knime://My%2DHub/x").unwrap();
        assert_eq!(url.mount_id(), Some("My-Hub"));
    }

    #[test]
    fn wrong_scheme_is_not_a_knime_url() {
        let err = KnimeUrl::parse("http://www.knime.com/").unwrap_err();
        assert!(matches!(err, ResolutionError::NotAKnimeUrl { .. }));
        assert!(err.to_string().contains("not a valid KNIME URL"));
        assert!(matches!(
            KnimeUrl::parse("no scheme"),
            Err(ResolutionError::NotAKnimeUrl { .. })
        ));
    }

    #[test]
    fn missing_authority_is_unrecognized() {
        for url in ["knime:///a/b", "knime:/a", "knime://"] {
            assert!(
                matches!(KnimeUrl::parse(url), Err(ResolutionError::UnrecognizedUrl { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let url = KnimeUrl::parse("KNIME://knime.workflow/x").unwrap();
        assert_eq!(url.category(), UrlCategory::WorkflowRelative);
    }

    #[test]
    fn parse_decodes_path_and_version() {
        let url = KnimeUrl::parse("knime://knime.space/boss/test%20small.txt?version=4#frag").unwrap();
        assert_eq!(url.path().segments(), &["boss", "test small.txt"]);
        assert_eq!(url.version(), Some(&ItemVersion::Specific(4)));
    }

    #[test]
    fn parse_keeps_parent_segments() {
        let url = KnimeUrl::parse("knime://knime.workflow/../x").unwrap();
        assert!(url.path().leaves_scope());
    }

    #[test]
    fn current_state_equals_omission() {
        let explicit = KnimeUrl::parse("knime://knime.workflow/x?version=current-state").unwrap();
        let omitted = KnimeUrl::parse("knime://knime.workflow/x").unwrap();
        assert_eq!(explicit, omitted);
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "knime://knime.workflow",
            "knime://knime.workflow/../workflow2",
            "knime://My-Hub/Users/john/test%20file%C3%96.txt?version=most-recent",
            "knime://knime.space/a?version=3",
        ] {
            let url = KnimeUrl::parse(text).unwrap();
            assert_eq!(url.to_string(), text);
        }
    }

    #[test]
    fn mount_id_only_for_absolute() {
        assert_eq!(
            KnimeUrl::parse("knime://LOCAL/x").unwrap().mount_id(),
            Some("LOCAL")
        );
        assert_eq!(KnimeUrl::parse("knime://knime.mountpoint/x").unwrap().mount_id(), None);
    }

    #[test]
    fn to_url_keeps_mount_id_case() {
        let url = KnimeUrl::mountpoint_absolute("LOCAL", RelPath::from("test.txt"), None)
            .to_url()
            .unwrap();
        assert_eq!(url.as_str(), "knime://LOCAL/test.txt");
    }

    #[test]
    fn category_authority_round_trip() {
        for category in UrlCategory::ALL {
            match category.authority() {
                Some(authority) => assert_eq!(UrlCategory::from_authority(authority), category),
                None => assert!(!category.is_relative()),
            }
        }
    }

    #[test]
    fn serde_as_string() {
        let url = KnimeUrl::workflow_relative(RelPath::from("a b"), None);
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"knime://knime.workflow/a%20b\"");
        let back: KnimeUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }
}
