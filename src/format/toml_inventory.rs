//! Structured TOML inventory format.
//!
//! ```toml
//! # DocInventory version 1
//! [Inventory]
//! format = "DocInventories v1"
//! project = "Demo"
//! version = "1.0"
//!
//! [[py.function]]
//! name = "demo.run"
//! uri = "api.html#$"
//!
//! [[std.label]]
//! dispname = "Getting Started"
//! name = "Getting-Started"
//! uri = "start.html"
//! ```
//!
//! Every top-level key other than `Inventory` is a domain; each domain maps
//! roles to arrays of items. `priority` and `dispname` are omitted when they
//! hold their defaults.

use super::{Codec, RawInventory};
use crate::error::{InventoryError, Result};
use crate::inventory::Inventory;
use crate::item::{DISPNAME_SENTINEL, InventoryItem, default_priority};
use anyhow::Context;
use std::collections::BTreeMap;
use toml::{Table, Value};
use tracing::warn;

const MARKER: &str = "# DocInventory version 1";
const MARKER_PREFIX: &str = "# DocInventory version";
const META_KEY: &str = "Inventory";
const FORMAT_ID: &str = "DocInventories v1";

/// Top-level keys written by earlier versions of the format. They are
/// ignored with a warning.
const LEGACY_KEYS: &[&str] = &["format", "project", "version"];

/// Codec for the structured TOML format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<RawInventory> {
        let text = std::str::from_utf8(bytes).context("TOML inventory is not valid UTF-8")?;
        check_marker(text.lines().next().unwrap_or(""))?;

        let table: Table = toml::from_str(text).context("Invalid TOML inventory")?;
        let (project, version) = parse_meta(table.get(META_KEY))?;

        let mut items = Vec::new();
        for (key, value) in &table {
            if key == META_KEY {
                continue;
            }
            if LEGACY_KEYS.contains(&key.as_str()) {
                warn!("Ignoring legacy top-level key {:?} in TOML inventory", key);
                continue;
            }
            let Value::Table(roles) = value else {
                return Err(InventoryError::format(format!(
                    "Invalid top-level key {:?} in TOML inventory: expected a domain table",
                    key
                ))
                .into());
            };
            parse_domain(key, roles, &mut items)?;
        }

        Ok(RawInventory {
            project,
            version,
            items,
        })
    }

    fn render(&self, inventory: &Inventory) -> anyhow::Result<Vec<u8>> {
        let mut domains: BTreeMap<&str, BTreeMap<&str, Vec<Value>>> = BTreeMap::new();
        for item in inventory.items() {
            if item.domain() == META_KEY || LEGACY_KEYS.contains(&item.domain()) {
                return Err(InventoryError::argument(format!(
                    "Domain {:?} is reserved in the TOML inventory format",
                    item.domain()
                ))
                .into());
            }
            domains
                .entry(item.domain())
                .or_default()
                .entry(item.role())
                .or_default()
                .push(Value::Table(render_item(item)));
        }

        let mut meta = Table::new();
        meta.insert("format".to_string(), Value::String(FORMAT_ID.to_string()));
        meta.insert(
            "project".to_string(),
            Value::String(inventory.project().to_string()),
        );
        meta.insert(
            "version".to_string(),
            Value::String(inventory.version().to_string()),
        );

        let mut root = Table::new();
        root.insert(META_KEY.to_string(), Value::Table(meta));
        for (domain, roles) in domains {
            let roles: Table = roles
                .into_iter()
                .map(|(role, entries)| (role.to_string(), Value::Array(entries)))
                .collect();
            root.insert(domain.to_string(), Value::Table(roles));
        }

        let body = toml::to_string(&root).context("Failed to serialize TOML inventory")?;
        Ok(format!("{}\n{}", MARKER, body).into_bytes())
    }
}

/// The marker line only warns when unrecognized, but a marker announcing a
/// different version of this format is an error.
fn check_marker(line: &str) -> Result<()> {
    let line = line.trim();
    if line == MARKER {
        return Ok(());
    }
    if line.starts_with(MARKER_PREFIX) {
        return Err(InventoryError::format(format!(
            "Unsupported TOML inventory version: {:?}",
            line
        )));
    }
    warn!("Unexpected first line in TOML inventory: {:?}", line);
    Ok(())
}

fn parse_meta(meta: Option<&Value>) -> Result<(String, String)> {
    let Some(Value::Table(meta)) = meta else {
        return Err(InventoryError::format(format!(
            "TOML inventory must contain an [{}] table with a `project` key",
            META_KEY
        )));
    };

    if let Some(format) = meta.get("format") {
        if format.as_str() != Some(FORMAT_ID) {
            return Err(InventoryError::format(format!(
                "Unsupported TOML inventory format {}",
                format
            )));
        }
    }

    for key in meta.keys() {
        if !matches!(key.as_str(), "format" | "project" | "version") {
            warn!("Ignoring unknown key {:?} in [{}]", key, META_KEY);
        }
    }

    let project = match meta.get("project") {
        Some(value) => scalar_string(value).ok_or_else(|| {
            InventoryError::format(format!("Invalid project {} in TOML inventory", value))
        })?,
        None => {
            return Err(InventoryError::format(format!(
                "Missing `project` in [{}] of TOML inventory",
                META_KEY
            )));
        }
    };
    let version = match meta.get("version") {
        Some(value) => scalar_string(value).ok_or_else(|| {
            InventoryError::format(format!("Invalid version {} in TOML inventory", value))
        })?,
        None => String::new(),
    };

    Ok((project, version))
}

/// Strings as-is; numbers coerced to their TOML spelling.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(_) | Value::Float(_) => Some(value.to_string()),
        _ => None,
    }
}

fn parse_domain(domain: &str, roles: &Table, items: &mut Vec<InventoryItem>) -> Result<()> {
    for (role, entries) in roles {
        let Value::Array(entries) = entries else {
            return Err(InventoryError::format(format!(
                "Expected an array of items for {}:{} in TOML inventory",
                domain, role
            )));
        };
        for entry in entries {
            let Value::Table(fields) = entry else {
                return Err(InventoryError::format(format!(
                    "Expected a table for item in {}:{}, found {}",
                    domain, role, entry
                )));
            };
            items.push(parse_item(domain, role, fields)?);
        }
    }
    Ok(())
}

fn parse_item(domain: &str, role: &str, fields: &Table) -> Result<InventoryItem> {
    let name = string_field(fields, "name", domain, role)?.ok_or_else(|| {
        InventoryError::format(format!("Item in {}:{} has no `name`", domain, role))
    })?;
    let uri = string_field(fields, "uri", domain, role)?.ok_or_else(|| {
        InventoryError::format(format!("Item {:?} in {}:{} has no `uri`", name, domain, role))
    })?;
    let dispname = string_field(fields, "dispname", domain, role)?.unwrap_or(name);
    let priority = match fields.get("priority") {
        None => default_priority(domain),
        Some(Value::Integer(p)) => i32::try_from(*p).map_err(|_| {
            InventoryError::format(format!("Priority {} of {:?} is out of range", p, name))
        })?,
        Some(other) => {
            return Err(InventoryError::format(format!(
                "Priority of {:?} must be an integer, found {}",
                name, other
            )));
        }
    };

    for key in fields.keys() {
        if !matches!(key.as_str(), "name" | "uri" | "dispname" | "priority") {
            warn!("Ignoring unknown field {:?} of item {:?}", key, name);
        }
    }

    InventoryItem::new(name, domain, role, priority, uri, dispname)
        .map_err(|e| InventoryError::format(format!("Invalid item in {}:{}: {}", domain, role, e)))
}

fn string_field<'t>(fields: &'t Table, key: &str, domain: &str, role: &str) -> Result<Option<&'t str>> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(InventoryError::format(format!(
            "Field `{}` of item in {}:{} must be a string, found {}",
            key, domain, role, other
        ))),
    }
}

fn render_item(item: &InventoryItem) -> Table {
    let mut fields = Table::new();
    fields.insert("name".to_string(), Value::String(item.name().to_string()));
    fields.insert(
        "uri".to_string(),
        Value::String(item.stored_uri().to_string()),
    );
    if item.priority() != default_priority(item.domain()) {
        fields.insert(
            "priority".to_string(),
            Value::Integer(i64::from(item.priority())),
        );
    }
    if item.stored_dispname() != DISPNAME_SENTINEL {
        fields.insert(
            "dispname".to_string(),
            Value::String(item.stored_dispname().to_string()),
        );
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn parse(text: &str) -> Result<RawInventory> {
        TomlCodec
            .parse(text.as_bytes())
            .map_err(|e| InventoryError::from_codec(e, "inventory.toml"))
    }

    #[test]
    fn parses_items_with_defaults() {
        let raw = parse(
            r##"# DocInventory version 1
[Inventory]
format = "DocInventories v1"
project = "Demo"
version = "1.0"

[[py.function]]
name = "demo.run"
uri = "api.html#$"

[[py.function]]
name = "demo.stop"
uri = "api.html#$"
priority = 2
dispname = "stop()"

[[std.label]]
name = "Getting-Started"
uri = "start.html"
dispname = "Getting Started"
"##,
        )
        .unwrap();

        check!(raw.project == "Demo");
        check!(raw.version == "1.0");
        check!(raw.items.len() == 3);
        check!(raw.items[0].priority() == 1);
        check!(raw.items[1].priority() == 2);
        check!(raw.items[1].dispname() == "stop()");
        check!(raw.items[2].priority() == -1);
        check!(raw.items[2].dispname() == "Getting Started");
    }

    #[rstest]
    #[case("version = 1", "1")]
    #[case("version = 2.5", "2.5")]
    #[case("version = \"v3\"", "v3")]
    fn numeric_versions_become_strings(#[case] line: &str, #[case] expected: &str) {
        let text = format!("# DocInventory version 1\n[Inventory]\nproject = \"x\"\n{}\n", line);
        check!(parse(&text).unwrap().version == expected);
    }

    #[test]
    fn missing_project_is_format_error() {
        let_assert!(Err(err) = parse("# DocInventory version 1\n[Inventory]\nversion = \"1\"\n"));
        check!(err.is_format());
        check!(err.to_string().contains("project"));
        let_assert!(Err(err) = parse("# DocInventory version 1\n"));
        check!(err.is_format());
    }

    #[test]
    fn unknown_marker_only_warns() {
        let raw = parse("# some other comment\n[Inventory]\nproject = \"x\"\n").unwrap();
        check!(raw.project == "x");
    }

    #[test]
    fn other_format_versions_are_rejected() {
        let_assert!(Err(err) = parse("# DocInventory version 2\n[Inventory]\nproject = \"x\"\n"));
        check!(err.is_format());
        let_assert!(
            Err(err) = parse("# DocInventory version 1\n[Inventory]\nformat = \"DocInventories v2\"\nproject = \"x\"\n")
        );
        check!(err.is_format());
    }

    #[test]
    fn unknown_top_level_key_is_format_error() {
        let_assert!(Err(err) = parse("# DocInventory version 1\nextra = 1\n[Inventory]\nproject = \"x\"\n"));
        check!(err.is_format());
        check!(err.to_string().contains("extra"));
    }

    #[test]
    fn legacy_top_level_keys_only_warn() {
        let raw = parse("# DocInventory version 1\nproject = \"old\"\n[Inventory]\nproject = \"x\"\n").unwrap();
        check!(raw.project == "x");
    }

    #[rstest]
    #[case("[[py.function]]\nuri = \"x.html\"\n")]
    #[case("[[py.function]]\nname = \"f\"\n")]
    #[case("[[py.function]]\nname = \"f\"\nuri = \"x.html\"\npriority = \"high\"\n")]
    #[case("[py]\nfunction = \"f\"\n")]
    #[case("[[py.function]]\nname = \"#f\"\nuri = \"x.html\"\n")]
    fn malformed_items_are_format_errors(#[case] items: &str) {
        let text = format!("# DocInventory version 1\n[Inventory]\nproject = \"x\"\n\n{}", items);
        let_assert!(Err(err) = parse(&text));
        check!(err.is_format());
    }

    #[test]
    fn invalid_toml_syntax_is_format_error() {
        let_assert!(Err(err) = parse("# DocInventory version 1\n[Inventory\n"));
        check!(err.is_format());
    }

    #[test]
    fn render_omits_defaults_and_sorts_keys() {
        let mut inventory = Inventory::new("Demo").with_version("1.0");
        inventory.push(InventoryItem::from_spec("Getting Started", "start.html").unwrap());
        inventory.push(InventoryItem::from_spec(":py:function:`demo.run`", "api.html#demo.run").unwrap());

        let text = String::from_utf8(TomlCodec.render(&inventory).unwrap()).unwrap();
        check!(text.starts_with("# DocInventory version 1\n"));
        check!(!text.contains("priority"));
        check!(text.contains("dispname = \"Getting Started\""));
        let py = text.find("[[py.function]]").unwrap();
        let std = text.find("[[std.label]]").unwrap();
        check!(text.find("[Inventory]").unwrap() < py);
        check!(py < std);

        let raw = TomlCodec.parse(text.as_bytes()).unwrap();
        check!(raw.project == "Demo");
        check!(raw.items.len() == 2);
    }

    #[test]
    fn render_rejects_reserved_domains() {
        let mut inventory = Inventory::new("x");
        inventory.push(InventoryItem::new("a", "Inventory", "label", 1, "", "a").unwrap());
        let_assert!(Err(err) = TomlCodec.render(&inventory));
        check!(InventoryError::from_codec(err, "x").is_argument());
    }
}
