//! Concrete URL builders
//!
//! Resolution ends in one of three URL shapes: a local `file:` URL, a
//! repository `https:` URL addressing an item's data, or a mountpoint
//! absolute `knime:` URL left for the mount table.

use std::path::Path;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::error::ResolutionError;
use crate::path::RelPath;
use crate::version::{ItemVersion, VERSION_PARAM};

/// Suffix asking a repository for an item's data instead of its metadata
pub const DATA_SUFFIX: &str = ":data";

/// Characters escaped inside a single path segment
pub(crate) const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters escaped in a mount id used as authority
pub(crate) const AUTHORITY: &AsciiSet = &SEGMENT.add(b':').add(b'@');

/// Escapes for a mount id that reads like a reserved marker
pub(crate) const MARKER_LOOKALIKE: &AsciiSet = &AUTHORITY.add(b'.');

/// Percent-encode every segment and join them with `/`
#[must_use]
pub fn encode_path(path: &RelPath) -> String {
    path.iter()
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// `file:` URL for a local path
///
/// UNC paths (`\\host\share` or `//host/share`) become `file:////host/share`.
///
/// # Errors
/// Returns [`ResolutionError::InvalidLocalPath`] for relative paths
pub fn file_url(path: &Path) -> Result<Url, ResolutionError> {
    let invalid = || ResolutionError::InvalidLocalPath {
        path: path.to_path_buf(),
    };

    let text = path.to_string_lossy();
    let unc = text.strip_prefix("\\\\").or_else(|| text.strip_prefix("//"));
    if let Some(unc) = unc.filter(|rest| !rest.starts_with(['/', '\\'])) {
        let segments = RelPath::parse(&unc.replace('\\', "/"));
        return Url::parse(&format!("file:////{}", encode_path(&segments))).map_err(|_| invalid());
    }

    Url::from_file_path(path).map_err(|()| invalid())
}

/// Repository URL for the data of the item at `path`
///
/// The last segment gets the [`DATA_SUFFIX`]; an empty path becomes a
/// synthetic `:data` segment. A version other than the current state is
/// added as `?version=`.
///
/// # Errors
/// Returns [`ResolutionError::InvalidContext`] if `base` cannot carry a path
pub fn repository_url(
    base: &Url,
    path: &RelPath,
    version: Option<&ItemVersion>,
) -> Result<Url, ResolutionError> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            ResolutionError::InvalidContext(format!("repository address '{base}' cannot hold a path"))
        })?;
        segments.pop_if_empty();
        match path.segments().split_last() {
            Some((last, parents)) => {
                segments.extend(parents);
                segments.push(&format!("{last}{DATA_SUFFIX}"));
            }
            None => {
                segments.push(DATA_SUFFIX);
            }
        }
    }

    url.set_query(None);
    if let Some(value) = version.and_then(ItemVersion::query_value) {
        url.query_pairs_mut().append_pair(VERSION_PARAM, &value);
    }
    Ok(url)
}
