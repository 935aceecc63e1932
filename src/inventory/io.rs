//! Loading, saving and converting inventories, and patching metadata of
//! stored inventory files.

use super::{Inventory, MetadataPatch};
use crate::error::{InventoryError, Result};
use crate::format::{Formats, MimeType, intersphinx};
use crate::search::{Diagnostic, DiagnosticSink, TracingSink};
use crate::source::{FetchPolicy, Source};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// How to load an inventory.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Format tag; inferred from the source's file name when unset.
    pub mime: Option<MimeType>,
    /// Root URL for item URIs; derived from URL sources when unset.
    pub root_url: Option<String>,
    pub fetch: FetchPolicy,
    pub formats: Formats,
}

impl LoadOptions {
    pub fn mime(mut self, mime: impl Into<MimeType>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    pub fn fetch(mut self, fetch: FetchPolicy) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn formats(mut self, formats: Formats) -> Self {
        self.formats = formats;
        self
    }
}

impl Inventory {
    /// Load an inventory from a local path or `http(s)://` URL.
    ///
    /// Diagnostics such as a missing root URL are logged.
    pub fn load(source: &str, options: &LoadOptions) -> Result<Self> {
        Self::load_with(source, options, &mut TracingSink)
    }

    /// Load an inventory, reporting diagnostics to `sink`.
    pub fn load_with(
        source: &str,
        options: &LoadOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self> {
        let start = Instant::now();
        let origin = Source::parse(source);

        // Resolve the format before fetching anything.
        let mime = options
            .formats
            .mime_type(options.mime.as_ref(), origin.file_name().as_deref())?;
        let codec = options.formats.codec(&mime)?;

        let bytes = origin.read(&options.fetch)?;
        debug!("Parsing {} ({} bytes) as {}", source, bytes.len(), mime);
        let raw = codec
            .parse(&bytes)
            .map_err(|e| InventoryError::from_codec(e, source))?;

        let root_url = match (&options.root_url, origin.root_url()) {
            (Some(root_url), _) => root_url.clone(),
            (None, Some(root_url)) => root_url,
            (None, None) => {
                sink.report(Diagnostic::MissingRootUrl {
                    source: source.to_string(),
                });
                String::new()
            }
        };

        let inventory = Self::from_raw(raw, root_url, source.to_string());
        info!(
            "Loaded {} items of {} {} from {} in {:?}",
            inventory.len(),
            inventory.project,
            inventory.version,
            source,
            start.elapsed()
        );
        Ok(inventory)
    }

    /// Write the inventory to `path`, inferring the format from its extension
    /// unless `mime` is given.
    pub fn save(&self, path: impl AsRef<Path>, mime: Option<&MimeType>) -> Result<()> {
        self.save_with(path, mime, &Formats::default())
    }

    pub fn save_with(
        &self,
        path: impl AsRef<Path>,
        mime: Option<&MimeType>,
        formats: &Formats,
    ) -> Result<()> {
        let path = path.as_ref();
        let file_name = path.file_name().map(|name| name.to_string_lossy());
        let mime = formats.mime_type(mime, file_name.as_deref())?;
        let codec = formats.codec(&mime)?;

        let bytes = codec
            .render(self)
            .map_err(|e| InventoryError::from_codec(e, &path.display().to_string()))?;
        std::fs::write(path, &bytes).map_err(|e| InventoryError::io(path, e))?;
        debug!("Wrote {} items to {} as {}", self.len(), path.display(), mime);
        Ok(())
    }
}

/// Load `input` and write it to `output`, possibly in another format.
///
/// The output format is `output_mime` if given, otherwise inferred from the
/// output file name. Returns the loaded inventory.
pub fn convert(
    input: &str,
    output: impl AsRef<Path>,
    options: &LoadOptions,
    output_mime: Option<&MimeType>,
) -> Result<Inventory> {
    let inventory = Inventory::load(input, options)?;
    inventory.save_with(output, output_mime, &options.formats)?;
    Ok(inventory)
}

/// Change the project and/or version stored in an inventory file.
///
/// Sphinx inventories (without gzip) only get their header lines rewritten;
/// the item records are copied unchanged. Other formats are decoded, patched
/// and encoded again.
pub fn set_metadata_in_file(
    path: impl AsRef<Path>,
    patch: &MetadataPatch,
    mime: Option<&MimeType>,
    formats: &Formats,
) -> Result<()> {
    let path = path.as_ref();
    let file_patch = MetadataPatch {
        root_url: None,
        ..patch.clone()
    };
    file_patch.validate()?;

    let file_name = path.file_name().map(|name| name.to_string_lossy());
    let mime = formats.mime_type(mime, file_name.as_deref())?;

    if mime.is_intersphinx() {
        debug!("Rewriting header of {}", path.display());
        return rewrite_in_place(path, &file_patch);
    }

    let bytes = Source::Local(path.to_path_buf()).read(&FetchPolicy::default())?;
    let label = path.display().to_string();
    let raw = formats
        .codec(&mime)?
        .parse(&bytes)
        .map_err(|e| InventoryError::from_codec(e, &label))?;

    let mut inventory = Inventory::new(raw.project).with_version(raw.version);
    inventory.append(raw.items);
    inventory
        .set_metadata(&file_patch)?
        .save_with(path, Some(&mime), formats)
}

/// Stream the header rewrite into a temporary file next to `path`, then move
/// it over the original.
fn rewrite_in_place(path: &Path, patch: &MetadataPatch) -> Result<()> {
    let io_error = |e| InventoryError::io(path, e);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let reader = BufReader::new(File::open(path).map_err(io_error)?);
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    intersphinx::rewrite_header(
        reader,
        BufWriter::new(temp.as_file_mut()),
        patch.project.as_deref(),
        patch.version.as_deref(),
        path,
    )?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
