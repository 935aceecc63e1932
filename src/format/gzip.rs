//! Gzip decorator usable with any codec.

use super::{Codec, RawInventory};
use crate::inventory::Inventory;
use anyhow::Context;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::sync::Arc;

/// Wraps another codec, gunzipping input before parsing and gzipping output
/// after rendering.
#[derive(Clone)]
pub struct GzipCodec {
    inner: Arc<dyn Codec>,
}

impl GzipCodec {
    pub fn new(inner: Arc<dyn Codec>) -> Self {
        Self { inner }
    }
}

impl Codec for GzipCodec {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<RawInventory> {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .context("Failed to decompress gzip stream")?;
        self.inner.parse(&decoded)
    }

    fn render(&self, inventory: &Inventory) -> anyhow::Result<Vec<u8>> {
        let rendered = self.inner.render(inventory)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&rendered)
            .context("Failed to compress gzip stream")?;
        encoder.finish().context("Failed to finish gzip stream")
    }
}
