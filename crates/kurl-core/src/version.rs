//! Item versions
//!
//! Hub-backed repositories keep numbered versions of every item. A URL
//! selects one with the `version` query parameter; omitting it means the
//! current state.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use url::form_urlencoded;

/// Query parameter carrying the item version
pub const VERSION_PARAM: &str = "version";

/// Deprecated query parameter, migrated to [`VERSION_PARAM`]
pub const LEGACY_SPACE_VERSION_PARAM: &str = "spaceVersion";

const CURRENT_STATE: &str = "current-state";
const MOST_RECENT: &str = "most-recent";

/// Version of a repository item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemVersion {
    /// Unversioned working state; never written to a URL
    CurrentState,
    /// Latest published version
    MostRecent,
    /// Explicit version number
    Specific(u64),
}

impl ItemVersion {
    /// Parse a `version` query value
    ///
    /// Returns `None` for anything but the three documented forms.
    #[must_use]
    pub fn from_query_value(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    /// Value to write into the `version` query parameter
    ///
    /// `None` for [`ItemVersion::CurrentState`], which is expressed by
    /// omitting the parameter.
    #[must_use]
    pub fn query_value(&self) -> Option<String> {
        match self {
            Self::CurrentState => None,
            other => Some(other.to_string()),
        }
    }

    /// Check for the unversioned state
    #[inline]
    #[must_use]
    pub fn is_current_state(&self) -> bool {
        matches!(self, Self::CurrentState)
    }

    /// Extract the item version from a URL query string
    ///
    /// The deprecated `spaceVersion` parameter is honoured when `version` is
    /// absent. Repeated `version` parameters are tolerated: the first one
    /// wins and a warning is logged. `current-state` yields `None`, as does
    /// an unparsable value.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        let mut versions = Vec::new();
        let mut legacy = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == VERSION_PARAM {
                versions.push(value.into_owned());
            } else if key == LEGACY_SPACE_VERSION_PARAM && legacy.is_none() {
                legacy = Some(value.into_owned());
            }
        }

        let raw = if let Some(first) = versions.first() {
            if versions.len() > 1 {
                tracing::warn!(
                    "Multiple '{}' parameters in query '{}', using the first one: {}",
                    VERSION_PARAM,
                    query,
                    first
                );
            }
            first.clone()
        } else if let Some(legacy) = legacy {
            tracing::debug!(
                "Migrating deprecated '{}={}' to '{}'",
                LEGACY_SPACE_VERSION_PARAM,
                legacy,
                VERSION_PARAM
            );
            legacy
        } else {
            return None;
        };

        Self::from_query_value(&raw).filter(|version| !version.is_current_state())
    }
}

impl Display for ItemVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentState => f.write_str(CURRENT_STATE),
            Self::MostRecent => f.write_str(MOST_RECENT),
            Self::Specific(number) => write!(f, "{number}"),
        }
    }
}

impl FromStr for ItemVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CURRENT_STATE => Ok(Self::CurrentState),
            MOST_RECENT => Ok(Self::MostRecent),
            // u64::from_str accepts a leading '+', version strings don't
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => digits
                .parse()
                .map(Self::Specific)
                .map_err(|_| VersionError(s.to_string())),
            _ => Err(VersionError(s.to_string())),
        }
    }
}

impl serde::Serialize for ItemVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ItemVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ItemVersionVisitor;

        impl serde::de::Visitor<'_> for ItemVersionVisitor {
            type Value = ItemVersion;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("\"current-state\", \"most-recent\" or a version number")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ItemVersion::Specific(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(ItemVersion::Specific)
                    .map_err(|_| serde::de::Error::custom(VersionError(value.to_string())))
            }
        }

        deserializer.deserialize_any(ItemVersionVisitor)
    }
}

/// Unrecognised version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid item version '{0}': expected 'current-state', 'most-recent' or a number")]
pub struct VersionError(pub String);
