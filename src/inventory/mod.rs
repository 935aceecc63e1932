//! The inventory container.
//!
//! An [`Inventory`] owns an ordered list of items plus project metadata. A
//! freshly constructed inventory is unsorted and items keep their insertion
//! order. Loaded inventories are sorted by name, and every later `push` keeps
//! them sorted by inserting at the binary-searched position.

mod io;

pub use io::{LoadOptions, convert, set_metadata_in_file};

use crate::error::{InventoryError, Result};
use crate::format::RawInventory;
use crate::item::InventoryItem;
use std::fmt;
use std::ops::Index;

/// A documentation inventory: project metadata plus its items.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    project: String,
    version: String,
    items: Vec<InventoryItem>,
    root_url: String,
    source: String,
    sorted: bool,
}

/// Equality covers metadata, items and sortedness, but not provenance.
impl PartialEq for Inventory {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project
            && self.version == other.version
            && self.root_url == other.root_url
            && self.sorted == other.sorted
            && self.items == other.items
    }
}

impl Eq for Inventory {}

impl Inventory {
    /// An empty, unsorted inventory for `project`.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the URL that relative item URIs are resolved against.
    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    /// Assemble a loaded inventory. Items are sorted by name.
    pub(crate) fn from_raw(raw: RawInventory, root_url: String, source: String) -> Self {
        let inventory = Self {
            project: raw.project,
            version: raw.version,
            items: raw.items,
            root_url,
            source,
            sorted: false,
        };
        inventory.sort()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Where the inventory came from: a path, a URL, `filter(..)` of another
    /// source, or empty for inventories built in memory.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&InventoryItem> {
        self.items.get(index)
    }

    /// The full URI of `item`, resolved against this inventory's root URL.
    pub fn uri(&self, item: &InventoryItem) -> String {
        item.uri(&self.root_url)
    }

    /// Add an item.
    ///
    /// A sorted inventory stays sorted: the item goes after every item whose
    /// name sorts before or equal to its own, so equal names keep call order.
    pub fn push(&mut self, item: InventoryItem) {
        if self.sorted {
            let index = self
                .items
                .partition_point(|probe| probe.name() <= item.name());
            self.items.insert(index, item);
        } else {
            self.items.push(item);
        }
    }

    /// Build an item from a spec string and add it.
    pub fn push_spec(&mut self, spec: &str, uri: impl Into<String>) -> Result<()> {
        self.push(InventoryItem::from_spec(spec, uri)?);
        Ok(())
    }

    pub fn append(&mut self, items: impl IntoIterator<Item = InventoryItem>) {
        for item in items {
            self.push(item);
        }
    }

    /// Sort items by name. Stable, and a no-op on a sorted inventory.
    pub fn sort(mut self) -> Self {
        if !self.sorted {
            self.items.sort_by(|a, b| a.name().cmp(b.name()));
            self.sorted = true;
        }
        self
    }

    /// A new inventory with the items matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&InventoryItem) -> bool) -> Self {
        Self {
            project: self.project.clone(),
            version: self.version.clone(),
            items: self
                .items
                .iter()
                .filter(|item| predicate(item))
                .cloned()
                .collect(),
            root_url: self.root_url.clone(),
            source: format!("filter({})", self.source),
            sorted: self.sorted,
        }
    }

    /// A copy of this inventory with `patch` applied.
    pub fn set_metadata(&self, patch: &MetadataPatch) -> Result<Self> {
        patch.validate()?;
        let mut inventory = self.clone();
        if let Some(project) = &patch.project {
            inventory.project = project.clone();
        }
        if let Some(version) = &patch.version {
            inventory.version = version.clone();
        }
        if let Some(root_url) = &patch.root_url {
            inventory.root_url = root_url.clone();
        }
        Ok(inventory)
    }
}

impl Index<usize> for Inventory {
    type Output = InventoryItem;

    fn index(&self, index: usize) -> &InventoryItem {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a InventoryItem;
    type IntoIter = std::slice::Iter<'a, InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inventory(project={:?}, version={:?}, root_url={:?}, items={})",
            self.project,
            self.version,
            self.root_url,
            self.items.len()
        )
    }
}

/// New values for an inventory's metadata. `None` fields are left alone.
///
/// The root URL is not stored in inventory files, so
/// [`set_metadata_in_file`] ignores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub project: Option<String>,
    pub version: Option<String>,
    pub root_url: Option<String>,
}

impl MetadataPatch {
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.version.is_none() && self.root_url.is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(InventoryError::argument("Nothing to update in metadata patch"));
        }
        if self.project.as_deref() == Some("") {
            return Err(InventoryError::argument("Project name must not be empty"));
        }
        let fields = [
            ("project", &self.project),
            ("version", &self.version),
            ("root_url", &self.root_url),
        ];
        for (field, value) in fields {
            if let Some(value) = value
                && value.contains(['\n', '\r'])
            {
                return Err(InventoryError::argument(format!(
                    "Metadata {} must be a single line: {:?}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}
