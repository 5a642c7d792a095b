//! Error types for URL resolution
//!
//! Every resolver reports failures through [`ResolutionError`]. Path and
//! version helpers have their own small error types which are converted at
//! the resolver boundary.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use crate::knime_url::UrlCategory;
use crate::path::PathError;

/// Containment root a resolved path must not leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Mount point root
    MountPoint,
    /// Hub space the workflow lives in
    HubSpace,
    /// Directory of the current workflow
    Workflow,
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MountPoint => "mount point",
            Self::HubSpace => "Hub space",
            Self::Workflow => "workflow",
        })
    }
}

/// Resolution failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Scheme is not `knime`
    #[error("'{url}' is not a valid KNIME URL")]
    NotAKnimeUrl {
        /// Offending input
        url: String,
    },

    /// `knime` scheme but authority or path cannot be classified
    #[error("'{url}' is not a valid KNIME URL: {reason}")]
    UnrecognizedUrl {
        /// Offending input
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// Resolved path leaves its permitted root
    #[error("Leaving the {scope} is not allowed for {category} URLs: '{path}' is not in '{root}'")]
    ScopeViolation {
        /// Root that was left
        scope: Scope,
        /// Category of the input URL
        category: UrlCategory,
        /// Normalized offending path
        path: String,
        /// Root the path had to stay in
        root: String,
    },

    /// Version given where the backing location has none
    #[error("Item versions are not supported {location}: '{url}'")]
    VersioningNotSupported {
        /// Offending input
        url: String,
        /// Where versions are unsupported, e.g. "on KNIME Server"
        location: String,
    },

    /// Node-relative URL before the workflow was saved
    #[error("Workflow must be saved before node relative URLs can be used: '{url}'")]
    WorkflowNotSaved {
        /// Offending input
        url: String,
    },

    /// Node-relative URLs cannot be used in this context
    #[error("Node relative URLs are not supported {reason}: '{url}'")]
    NodeRelativeNotSupported {
        /// Offending input
        url: String,
        /// Context that forbids them
        reason: String,
    },

    /// Node sandbox forbids workflow-relative URLs
    #[error("Workflow relative URLs are not allowed in this node context: '{url}'")]
    WorkflowRelativeAccessDenied {
        /// Offending input
        url: String,
    },

    /// Node sandbox forbids the workflow data area
    #[error("Accessing the workflow data area is not allowed in this node context: '{url}'")]
    DataAreaAccessDenied {
        /// Offending input
        url: String,
    },

    /// Mount id not known to this resolver
    #[error("Unknown mount ID '{mount_id}' in '{url}'")]
    UnknownMountId {
        /// Offending input
        url: String,
        /// Mount id from the URL authority
        mount_id: String,
    },

    /// Relative URL without any execution context
    #[error("Cannot resolve '{url}' without a workflow context")]
    NoWorkflowContext {
        /// Offending input
        url: String,
    },

    /// Mountpoint or space relative URL for a workflow outside any mount point
    #[error("Cannot resolve '{url}' because the workflow is not located in a mount point")]
    NoMountpoint {
        /// Offending input
        url: String,
    },

    /// Node-relative URL without a current node
    #[error("Cannot resolve node relative URL '{url}' without a node context")]
    NoNodeContext {
        /// Offending input
        url: String,
    },

    /// Execution context descriptor is inconsistent
    #[error("invalid execution context: {0}")]
    InvalidContext(String),

    /// Local path cannot be written as a `file:` URL
    #[error("cannot convert local path '{}' to a file URL", path.display())]
    InvalidLocalPath {
        /// Offending local path
        path: PathBuf,
    },
}

impl ResolutionError {
    /// Build a scope violation from a failed containment check
    #[must_use]
    pub fn scope_violation(scope: Scope, category: UrlCategory, error: PathError) -> Self {
        match error {
            PathError::Escapes { path, boundary } => Self::ScopeViolation {
                scope,
                category,
                path,
                root: boundary,
            },
            PathError::NotRelative(path) => Self::InvalidContext(format!(
                "'{path}' is not a path relative to the {scope}"
            )),
        }
    }

    /// Build a versioning error
    #[must_use]
    pub fn versioning_not_supported(url: impl Display, location: impl Into<String>) -> Self {
        Self::VersioningNotSupported {
            url: url.to_string(),
            location: location.into(),
        }
    }

    /// Check if the error stems from a sandbox restriction
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::NodeRelativeNotSupported { .. }
                | Self::WorkflowRelativeAccessDenied { .. }
                | Self::DataAreaAccessDenied { .. }
        )
    }

    /// Check if the user can fix the error without changing the URL
    #[inline]
    #[must_use]
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Self::WorkflowNotSaved { .. })
    }
}
