//! Wire formats for inventories.
//!
//! Each format is a [`Codec`] registered under a MIME-like tag in a
//! [`CodecRegistry`]. A tag with a `+gzip` suffix resolves to the inner tag's
//! codec wrapped in gzip (de)compression, whatever the inner format is.

mod gzip;
pub(crate) mod intersphinx;
mod mime;
pub(crate) mod toml_inventory;

pub use gzip::GzipCodec;
pub use intersphinx::IntersphinxCodec;
pub use mime::{ExtensionTable, MimeType};
pub use toml_inventory::TomlCodec;

use crate::error::{InventoryError, Result};
use crate::inventory::Inventory;
use crate::item::InventoryItem;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Contents decoded from a source, before the inventory is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInventory {
    pub project: String,
    pub version: String,
    pub items: Vec<InventoryItem>,
}

/// A parse/render pair for one wire format.
///
/// Implementations report malformed content as
/// [`InventoryError::Format`] wrapped in `anyhow::Error`; lower level decode
/// failures may be returned as-is and are classified when loading.
pub trait Codec: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<RawInventory>;

    fn render(&self, inventory: &Inventory) -> anyhow::Result<Vec<u8>>;
}

/// Maps MIME tags to codecs.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::empty()
            .with(MimeType::INTERSPHINX, IntersphinxCodec::compressed())
            .with(MimeType::INTERSPHINX_TEXT, IntersphinxCodec::plain())
            .with(MimeType::TOML, TomlCodec)
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.codecs.keys().collect();
        tags.sort();
        f.debug_struct("CodecRegistry").field("tags", &tags).finish()
    }
}

impl CodecRegistry {
    /// A registry without any codecs.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` under `tag`, replacing any previous registration.
    pub fn register(&mut self, tag: impl Into<String>, codec: impl Codec + 'static) {
        self.codecs.insert(tag.into(), Arc::new(codec));
    }

    pub fn with(mut self, tag: impl Into<String>, codec: impl Codec + 'static) -> Self {
        self.register(tag, codec);
        self
    }

    /// Find the codec for `mime`, applying the gzip decorator for `+gzip` tags.
    pub fn resolve(&self, mime: &MimeType) -> Result<Arc<dyn Codec>> {
        if let Some(codec) = self.codecs.get(mime.as_str()) {
            return Ok(Arc::clone(codec));
        }
        if let Some(inner) = mime.without_gzip()
            && let Some(codec) = self.codecs.get(inner.as_str())
        {
            return Ok(Arc::new(GzipCodec::new(Arc::clone(codec))));
        }
        Err(InventoryError::argument(format!(
            "Unsupported inventory format {:?}",
            mime.as_str()
        )))
    }
}

/// Extension table and codec registry used together to pick a format.
#[derive(Debug, Clone, Default)]
pub struct Formats {
    pub extensions: ExtensionTable,
    pub codecs: CodecRegistry,
}

impl Formats {
    /// Use `explicit` if given, otherwise infer the tag from `file_name`.
    pub fn mime_type(&self, explicit: Option<&MimeType>, file_name: Option<&str>) -> Result<MimeType> {
        match (explicit, file_name) {
            (Some(mime), _) => Ok(mime.clone()),
            (None, Some(file_name)) => self.extensions.infer(file_name),
            (None, None) => Err(InventoryError::argument(
                "Cannot determine MIME type: source has no file name",
            )),
        }
    }

    pub fn codec(&self, mime: &MimeType) -> Result<Arc<dyn Codec>> {
        self.codecs.resolve(mime)
    }
}
