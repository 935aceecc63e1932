//! Read, write and search Sphinx-style documentation inventories.
//!
//! An inventory maps named documentation objects (functions, classes,
//! section labels, ...) to URIs below a project's documentation root. This
//! crate loads inventories from files or URLs in the Sphinx `objects.inv`
//! format or a structured TOML format, and answers exact lookups and
//! pattern searches against them.
//!
//! ```no_run
//! use doc_inventory::{Inventory, LoadOptions};
//!
//! let inventory = Inventory::load(
//!     "https://www.sphinx-doc.org/en/master/objects.inv",
//!     &LoadOptions::default(),
//! )?;
//! if let Some(item) = inventory.lookup(":py:class:`sphinx.application.Sphinx`")? {
//!     println!("{}", inventory.uri(item));
//! }
//! # Ok::<(), doc_inventory::InventoryError>(())
//! ```

pub mod error;
pub mod format;
pub mod inventory;
pub mod item;
pub mod search;
pub mod source;
pub mod tracing;

pub use error::{InventoryError, Result};
pub use format::{Codec, CodecRegistry, ExtensionTable, Formats, MimeType, RawInventory};
pub use inventory::{Inventory, LoadOptions, MetadataPatch, convert, set_metadata_in_file};
pub use item::{InventoryItem, ItemBuilder, slugify};
pub use search::{Diagnostic, DiagnosticSink, Pattern, Query, Quiet, TracingSink};
pub use source::{FetchPolicy, Source, split_url};
