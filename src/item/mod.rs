//! Inventory items: validated link targets inside a project's documentation.

mod slug;
pub(crate) mod spec;

pub use slug::slugify;

use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder at the end of a stored uri standing in for the item name.
pub const URI_PLACEHOLDER: char = '$';

/// Stored display name meaning "same as the item name".
pub const DISPNAME_SENTINEL: &str = "-";

/// Domain for generic items such as section labels and documents.
pub const STD_DOMAIN: &str = "std";

/// Domain assumed for a role given without a domain, unless the role is one of
/// [`STD_ROLES`].
pub const DEFAULT_DOMAIN: &str = "py";

/// Roles that belong to the `std` domain when no domain is given.
pub const STD_ROLES: &[&str] = &["label", "doc"];

/// Default priority for items of `domain`: hidden for `std`, normal otherwise.
pub fn default_priority(domain: &str) -> i32 {
    if domain == STD_DOMAIN { -1 } else { 1 }
}

/// A single linkable object in an inventory.
///
/// Fields are normalized on construction: the uri is stored relative with its
/// name suffix abbreviated to [`URI_PLACEHOLDER`], and a display name equal to
/// the name is stored as [`DISPNAME_SENTINEL`]. Use [`InventoryItem::uri`] and
/// [`InventoryItem::dispname`] to get the expanded values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ItemFields")]
pub struct InventoryItem {
    name: String,
    domain: String,
    role: String,
    priority: i32,
    uri: String,
    dispname: String,
}

/// Unvalidated field set, used to route deserialization through
/// [`InventoryItem::new`].
#[derive(Deserialize)]
struct ItemFields {
    name: String,
    domain: String,
    role: String,
    priority: i32,
    uri: String,
    dispname: String,
}

impl TryFrom<ItemFields> for InventoryItem {
    type Error = InventoryError;

    fn try_from(fields: ItemFields) -> Result<Self> {
        Self::new(
            fields.name,
            fields.domain,
            fields.role,
            fields.priority,
            fields.uri,
            fields.dispname,
        )
    }
}

impl InventoryItem {
    /// Create an item from explicit field values, validating and normalizing
    /// each of them.
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        role: impl Into<String>,
        priority: i32,
        uri: impl Into<String>,
        dispname: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let domain = domain.into();
        let role = role.into();
        let uri = uri.into();
        let dispname = dispname.into();

        if name.is_empty() {
            return Err(InventoryError::argument("Item name must not be empty"));
        }
        if name.starts_with('#') {
            return Err(InventoryError::argument(format!(
                "Item name {:?} must not start with '#'",
                name
            )));
        }
        if domain.is_empty() || domain.contains(|c: char| c.is_whitespace() || c == ':') {
            return Err(InventoryError::argument(format!(
                "Invalid domain {:?} for {:?}: must be a non-empty token without whitespace or ':'",
                domain, name
            )));
        }
        if role.is_empty() || role.contains(char::is_whitespace) {
            return Err(InventoryError::argument(format!(
                "Invalid role {:?} for {:?}: must be a non-empty token without whitespace",
                role, name
            )));
        }
        if uri.contains(char::is_whitespace) {
            return Err(InventoryError::argument(format!(
                "Invalid uri {:?} for {:?}: must not contain whitespace",
                uri, name
            )));
        }
        if is_absolute(&uri) {
            return Err(InventoryError::argument(format!(
                "Invalid uri {:?} for {:?}: must be relative",
                uri, name
            )));
        }
        if dispname.is_empty() {
            return Err(InventoryError::argument(format!(
                "Display name for {:?} must not be empty",
                name
            )));
        }

        let uri = abbreviate_uri(uri.strip_prefix('/').unwrap_or(&uri), &name);
        let dispname = if dispname == name {
            DISPNAME_SENTINEL.to_string()
        } else {
            dispname
        };

        Ok(Self {
            name,
            domain,
            role,
            priority,
            uri,
            dispname,
        })
    }

    /// Create an item from a spec string and uri with default priority and
    /// display name.
    ///
    /// ```
    /// use doc_inventory::InventoryItem;
    ///
    /// let item = InventoryItem::from_spec("Sphinx", "Sphinx_(documentation_generator)").unwrap();
    /// assert_eq!(item.spec(), ":std:label:`Sphinx`");
    /// assert_eq!(item.priority(), -1);
    /// ```
    pub fn from_spec(spec: &str, uri: impl Into<String>) -> Result<Self> {
        Self::builder(spec)?.uri(uri).build()
    }

    /// Start building an item from a spec string.
    ///
    /// `spec` is either ``[:[domain:]role:]`name` `` or a bare section title.
    /// A bare title becomes a `std:label` item named by [`slugify`], keeping
    /// the title as its display name.
    pub fn builder(spec: &str) -> Result<ItemBuilder> {
        let parts = spec::split_spec(spec)?;

        let Some(role) = parts.role else {
            if parts.quoted {
                return Err(InventoryError::argument(format!(
                    "Spec {:?} must name a role, e.g. :function:{}",
                    spec, spec
                )));
            }
            return Ok(ItemBuilder {
                name: slugify(parts.name),
                domain: STD_DOMAIN.to_string(),
                role: "label".to_string(),
                priority: None,
                uri: String::new(),
                dispname: Some(parts.name.to_string()),
            });
        };

        let domain = match parts.domain {
            Some(domain) => domain,
            None if STD_ROLES.contains(&role) => STD_DOMAIN,
            None => DEFAULT_DOMAIN,
        };

        Ok(ItemBuilder {
            name: parts.name.to_string(),
            domain: domain.to_string(),
            role: role.to_string(),
            priority: None,
            uri: String::new(),
            dispname: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The uri as stored, possibly ending in [`URI_PLACEHOLDER`].
    pub fn stored_uri(&self) -> &str {
        &self.uri
    }

    /// The display name as stored, possibly [`DISPNAME_SENTINEL`].
    pub fn stored_dispname(&self) -> &str {
        &self.dispname
    }

    /// Full uri: placeholder expanded and `root_url` prepended.
    pub fn uri(&self, root_url: &str) -> String {
        let relative = match self.uri.strip_suffix(URI_PLACEHOLDER) {
            Some(prefix) => format!("{}{}", prefix, self.name),
            None => self.uri.clone(),
        };
        format!("{}{}", root_url, relative)
    }

    /// Display name with the sentinel expanded.
    pub fn dispname(&self) -> &str {
        if self.dispname == DISPNAME_SENTINEL {
            &self.name
        } else {
            &self.dispname
        }
    }

    /// Canonical reference form ``:domain:role:`name` ``.
    pub fn spec(&self) -> String {
        format!(":{}:{}:`{}`", self.domain, self.role, self.name)
    }

    /// Whether the item is excluded from lookups that skip hidden items.
    pub const fn is_hidden(&self) -> bool {
        self.priority < 0
    }

    /// Rank used to order candidates; lower ranks first.
    pub const fn rank(&self) -> u32 {
        self.priority.unsigned_abs()
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InventoryItem({:?}, domain={:?}, role={:?}, priority={}, uri={:?}, dispname={:?})",
            self.name, self.domain, self.role, self.priority, self.uri, self.dispname
        )
    }
}

/// Builder returned by [`InventoryItem::builder`].
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    name: String,
    domain: String,
    role: String,
    priority: Option<i32>,
    uri: String,
    dispname: Option<String>,
}

impl ItemBuilder {
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Override the priority derived from the domain.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn dispname(mut self, dispname: impl Into<String>) -> Self {
        self.dispname = Some(dispname.into());
        self
    }

    pub fn build(self) -> Result<InventoryItem> {
        let priority = self
            .priority
            .unwrap_or_else(|| default_priority(&self.domain));
        let dispname = self.dispname.unwrap_or_else(|| self.name.clone());
        InventoryItem::new(
            self.name,
            self.domain,
            self.role,
            priority,
            self.uri,
            dispname,
        )
    }
}

fn is_absolute(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Replace a trailing copy of `name` with the placeholder.
fn abbreviate_uri(uri: &str, name: &str) -> String {
    match uri.strip_suffix(name) {
        Some(prefix) => format!("{}{}", prefix, URI_PLACEHOLDER),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn item(name: &str, uri: &str) -> InventoryItem {
        InventoryItem::new(name, "py", "function", 1, uri, name).unwrap()
    }

    #[test]
    fn placeholder_expands_to_name() {
        let item = item("Foo", "#$");
        check!(item.uri("") == "#Foo");
        check!(item.uri("https://example.com/docs/") == "https://example.com/docs/#Foo");
    }

    #[test]
    fn uri_tail_matching_name_is_abbreviated() {
        let item = item("pkg.func", "api/#pkg.func");
        check!(item.stored_uri() == "api/#$");
        check!(item.uri("") == "api/#pkg.func");
    }

    #[test]
    fn leading_slash_is_stripped() {
        check!(item("x", "/api/index.html").stored_uri() == "api/index.html");
    }

    #[test]
    fn dispname_collapses_to_sentinel() {
        let same = item("Foo", "#$");
        check!(same.stored_dispname() == "-");
        check!(same.dispname() == "Foo");

        let other = InventoryItem::new("Foo", "py", "class", 1, "#$", "The Foo class").unwrap();
        check!(other.stored_dispname() == "The Foo class");
        check!(other.dispname() == "The Foo class");
    }

    #[rstest]
    #[case("", "py", "function", "x.html", "x")]
    #[case("#anchor", "py", "function", "x.html", "x")]
    #[case("foo", "", "function", "x.html", "x")]
    #[case("foo", "py thon", "function", "x.html", "x")]
    #[case("foo", "py:x", "function", "x.html", "x")]
    #[case("foo", "py", "", "x.html", "x")]
    #[case("foo", "py", "func tion", "x.html", "x")]
    #[case("foo", "py", "function", "x y.html", "x")]
    #[case("foo", "py", "function", "https://example.com/x.html", "x")]
    #[case("foo", "py", "function", "x.html", "")]
    fn invalid_fields_are_rejected(
        #[case] name: &str,
        #[case] domain: &str,
        #[case] role: &str,
        #[case] uri: &str,
        #[case] dispname: &str,
    ) {
        let_assert!(Err(err) = InventoryItem::new(name, domain, role, 1, uri, dispname));
        check!(err.is_argument());
    }

    #[test]
    fn bare_title_becomes_section_label() {
        let item = InventoryItem::from_spec("Getting Started", "start/").unwrap();
        check!(item.name() == "Getting-Started");
        check!(item.domain() == "std");
        check!(item.role() == "label");
        check!(item.priority() == -1);
        check!(item.dispname() == "Getting Started");
        check!(item.stored_uri() == "start/");
    }

    #[rstest]
    #[case(":label:`intro`", "std", "label", -1)]
    #[case(":doc:`index`", "std", "doc", -1)]
    #[case(":function:`run`", "py", "function", 1)]
    #[case(":c:function:`printf`", "c", "function", 1)]
    #[case(":std:term:`Inventory`", "std", "term", -1)]
    fn role_and_domain_defaults(
        #[case] spec: &str,
        #[case] domain: &str,
        #[case] role: &str,
        #[case] priority: i32,
    ) {
        let item = InventoryItem::from_spec(spec, "page.html").unwrap();
        check!(item.domain() == domain);
        check!(item.role() == role);
        check!(item.priority() == priority);
    }

    #[test]
    fn builder_overrides_defaults() {
        let item = InventoryItem::builder(":py:method:`Foo.bar`")
            .unwrap()
            .uri("api.html#$")
            .priority(0)
            .dispname("Foo.bar()")
            .build()
            .unwrap();
        check!(item.priority() == 0);
        check!(item.dispname() == "Foo.bar()");
        check!(item.uri("") == "api.html#Foo.bar");
    }

    #[test]
    fn quoted_name_without_role_is_rejected() {
        let_assert!(Err(err) = InventoryItem::from_spec("`Foo`", "#$"));
        check!(err.is_argument());
    }

    #[rstest]
    #[case(":py:function:")]
    #[case(":function:")]
    fn dangling_prefix_is_rejected(#[case] spec: &str) {
        let_assert!(Err(err) = InventoryItem::from_spec(spec, "x.html"));
        check!(err.is_argument());
    }

    #[test]
    fn colons_after_full_prefix_stay_in_name() {
        let item = InventoryItem::from_spec(":cpp:function:ns::run", "api.html#$").unwrap();
        check!(item.domain() == "cpp");
        check!(item.role() == "function");
        check!(item.name() == "ns::run");
    }

    #[test]
    fn spec_and_display() {
        let item = item("Foo", "#$");
        check!(item.spec() == ":py:function:`Foo`");
        check!(
            item.to_string()
                == r##"InventoryItem("Foo", domain="py", role="function", priority=1, uri="#$", dispname="-")"##
        );
    }

    #[test]
    fn rank_ignores_sign() {
        check!(item("a", "").rank() == 1);
        let hidden = InventoryItem::new("a", "std", "label", -1, "", "a").unwrap();
        check!(hidden.rank() == 1);
        check!(hidden.is_hidden());
    }
}
