//! Shared fixtures for integration tests.
//!
//! Tests that touch the filesystem get a [`TempWorkspace`]: a fresh temporary
//! directory removed when the fixture is dropped.

use doc_inventory::{Inventory, InventoryItem, LoadOptions, Quiet};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory for inventory files.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        doc_inventory::tracing::init();
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Writes `content` to `name` and returns its path as a load source.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: impl AsRef<[u8]>) -> String {
        let path = self.file(name);
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", name, e));
        path.to_string_lossy().into_owned()
    }

    /// Reads back a file written by a test.
    pub fn read(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.file(name))
            .unwrap_or_else(|e| panic!("Failed to read file '{}': {}", name, e))
    }

    /// Loads `name` without logging diagnostics.
    pub fn load(&self, name: &str) -> doc_inventory::Result<Inventory> {
        Inventory::load_with(
            &self.file(name).to_string_lossy(),
            &LoadOptions::default(),
            &mut Quiet,
        )
    }
}

#[fixture]
#[allow(dead_code)]
pub fn workspace() -> TempWorkspace {
    TempWorkspace::new()
}

/// A small inventory mixing domains, priorities and uri shapes.
#[fixture]
#[allow(dead_code)]
pub fn demo() -> Inventory {
    let mut inventory = Inventory::new("Demo")
        .with_version("1.2")
        .with_root_url("https://demo.example.org/");
    for (spec, uri) in [
        (":py:module:`demo`", "api.html#module-$"),
        (":py:function:`demo.run`", "api.html#$"),
        (":py:class:`demo.Runner`", "api.html#$"),
        (":std:doc:`index`", "index.html"),
        ("Getting Started", "start.html#getting-started"),
    ] {
        inventory
            .push_spec(spec, uri)
            .unwrap_or_else(|e| panic!("Invalid fixture item {}: {}", spec, e));
    }
    inventory.push(
        InventoryItem::builder(":c:function:`demo_run`")
            .and_then(|builder| builder.uri("c.html#$").priority(2).dispname("demo_run()").build())
            .expect("valid fixture item"),
    );
    inventory
}
