//! kurl command line support
//!
//! Loading of context files and rendering of resolution reports for the
//! `kurl` binary.
//!
//! A context file holds an optional `[resolver]` table with a
//! [`ResolverConfig`] and an optional `[context]` table with an
//! [`ExecutionContext`]. Without `[context]` URLs are resolved contextless.
//!
//! ```toml
//! [resolver]
//! external-mounts = "reject"
//!
//! [context]
//! type = "analytics-platform-local"
//! local-workflow-path = "/home/me/knime-workspace/group/workflow"
//!
//! [context.mountpoint]
//! mount-id = "LOCAL"
//! root = "/home/me/knime-workspace"
//! ```

#![warn(unreachable_pub)]

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

use anyhow::{Context, Result};
use kurl_core::{classify, ItemVersion, RelPath, ResolvedUrl, UrlCategory};
use kurl_resolver::{ExecutionContext, KnimeUrlResolver, NodeContext, ResolverConfig};
use serde::{Deserialize, Serialize};

/// Contents of a context file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFile {
    /// Resolver policy
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Execution context; none means contextless resolution
    #[serde(default)]
    pub context: Option<ExecutionContext>,
}

impl ContextFile {
    /// Load from `path`; JSON if the extension is `.json`, TOML otherwise
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context file '{}'", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON context file '{}'", path.display()))
        } else {
            toml::from_str(&text)
                .with_context(|| format!("invalid TOML context file '{}'", path.display()))
        }
    }

    /// Build the resolver for this file's context
    ///
    /// # Errors
    /// Fails for inconsistent context descriptors
    pub fn resolver(&self) -> Result<KnimeUrlResolver> {
        KnimeUrlResolver::for_context(self.context.as_ref(), &self.resolver)
            .context("invalid execution context")
    }
}

/// Operation requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Category, path and version of a URL
    Classify,
    /// Concrete URL
    Resolve,
    /// Mountpoint-absolute form
    Absolute,
    /// All symbolic forms
    LinkTypes,
}

impl Operation {
    /// Operation for a subcommand name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classify" => Some(Self::Classify),
            "resolve" => Some(Self::Resolve),
            "absolute" => Some(Self::Absolute),
            "link-types" => Some(Self::LinkTypes),
            _ => None,
        }
    }
}

/// Result of one operation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum Report {
    /// See [`Operation::Classify`]
    Classify {
        /// URL category
        category: UrlCategory,
        /// Decoded path
        path: RelPath,
        /// Item version, if any
        version: Option<ItemVersion>,
    },
    /// See [`Operation::Resolve`]
    Resolve {
        /// Resolver that produced the result
        resolver: &'static str,
        /// Full result
        resolved: ResolvedUrl,
    },
    /// See [`Operation::Absolute`]
    Absolute {
        /// Absolute form, if the target has one
        url: Option<String>,
    },
    /// See [`Operation::LinkTypes`]
    LinkTypes {
        /// Symbolic form per category
        forms: BTreeMap<UrlCategory, String>,
    },
}

impl Report {
    /// Run `operation` on `url`
    ///
    /// # Errors
    /// Fails if the URL cannot be resolved in the resolver's context
    pub fn run(
        operation: Operation,
        resolver: &KnimeUrlResolver,
        url: &str,
        node: Option<&NodeContext>,
    ) -> Result<Self> {
        tracing::debug!("Running {:?} on '{}'", operation, url);
        let report = match operation {
            Operation::Classify => {
                let (category, path, version) = classify(url)?;
                Self::Classify {
                    category,
                    path,
                    version,
                }
            }
            Operation::Resolve => Self::Resolve {
                resolver: resolver.name(),
                resolved: resolver.resolve_details(url, node)?,
            },
            Operation::Absolute => Self::Absolute {
                url: resolver
                    .resolve_to_absolute(url, node)?
                    .map(|absolute| absolute.to_string()),
            },
            Operation::LinkTypes => Self::LinkTypes {
                forms: resolver
                    .change_link_type(url, node)?
                    .into_iter()
                    .map(|(category, form)| (category, form.to_string()))
                    .collect(),
            },
        };
        Ok(report)
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    /// Fails only if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classify {
                category,
                path,
                version,
            } => {
                writeln!(f, "category: {category}")?;
                writeln!(f, "path:     {path}")?;
                match version {
                    Some(version) => write!(f, "version:  {version}"),
                    None => write!(f, "version:  -"),
                }
            }
            Self::Resolve { resolved, .. } => write!(f, "{}", resolved.resource_url()),
            Self::Absolute { url } => write!(f, "{}", url.as_deref().unwrap_or("-")),
            Self::LinkTypes { forms } => {
                let lines: Vec<String> = forms
                    .iter()
                    .map(|(category, form)| format!("{category}: {form}"))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
        }
    }
}
