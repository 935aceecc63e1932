//! MIME tags and the file extension table used to infer them.

use crate::error::{InventoryError, Result};
use std::fmt;
use std::str::FromStr;

/// A MIME-like format tag, e.g. `application/x-intersphinx` or
/// `application/toml+gzip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(String);

impl MimeType {
    /// Sphinx `objects.inv`: text header with a zlib-compressed body.
    pub const INTERSPHINX: &'static str = "application/x-intersphinx";
    /// Sphinx inventory with an uncompressed body.
    pub const INTERSPHINX_TEXT: &'static str = "text/x-intersphinx";
    /// Structured TOML inventory.
    pub const TOML: &'static str = "application/toml";

    const GZIP_SUFFIX: &'static str = "+gzip";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_gzip(&self) -> bool {
        self.0.ends_with(Self::GZIP_SUFFIX)
    }

    /// The inner tag of a `+gzip` tag.
    pub fn without_gzip(&self) -> Option<Self> {
        self.0
            .strip_suffix(Self::GZIP_SUFFIX)
            .map(|inner| Self(inner.to_string()))
    }

    /// Whether the tag is one of the two Sphinx record formats, without gzip.
    pub(crate) fn is_intersphinx(&self) -> bool {
        matches!(self.as_str(), Self::INTERSPHINX | Self::INTERSPHINX_TEXT)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MimeType {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('/') {
            Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(Self::new(s)),
            _ => Err(InventoryError::argument(format!(
                "Invalid MIME type {:?}",
                s
            ))),
        }
    }
}

impl From<&str> for MimeType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Default file extensions and their formats.
const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    (".inv", MimeType::INTERSPHINX),
    (".txt", MimeType::INTERSPHINX_TEXT),
    (".txt.gz", "text/x-intersphinx+gzip"),
    (".toml", MimeType::TOML),
    (".toml.gz", "application/toml+gzip"),
];

/// Maps file name suffixes to MIME tags. The longest matching suffix wins, so
/// `.txt.gz` takes precedence over `.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    entries: Vec<(String, MimeType)>,
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_EXTENSIONS
                .iter()
                .map(|(ext, tag)| ((*ext).to_string(), MimeType::new(*tag)))
                .collect(),
        }
    }
}

impl ExtensionTable {
    /// Add or replace the tag for `extension` (including the leading dot).
    pub fn with(mut self, extension: impl Into<String>, mime: impl Into<MimeType>) -> Self {
        let extension = extension.into();
        let mime = mime.into();
        match self.entries.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(entry) => entry.1 = mime,
            None => self.entries.push((extension, mime)),
        }
        self
    }

    /// Infer the MIME tag for `file_name` from its longest matching suffix.
    pub fn infer(&self, file_name: &str) -> Result<MimeType> {
        self.entries
            .iter()
            .filter(|(ext, _)| file_name.ends_with(ext.as_str()))
            .max_by_key(|(ext, _)| ext.len())
            .map(|(_, mime)| mime.clone())
            .ok_or_else(|| {
                InventoryError::argument(format!(
                    "Cannot determine MIME type for {:?}",
                    file_name
                ))
            })
    }
}

impl From<String> for MimeType {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}
