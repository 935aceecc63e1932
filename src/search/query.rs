//! Lookup queries and key parsing.

use crate::error::{InventoryError, Result};
use crate::item::InventoryItem;
use crate::item::spec::split_spec;
use std::fmt;
use std::str::FromStr;

/// An exact-name lookup, optionally restricted by domain and role.
///
/// An empty `domain` or `role` matches any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: String,
    pub domain: String,
    pub role: String,
    pub include_hidden: bool,
}

impl Query {
    /// Match `name` in any domain and role, hidden items included.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: String::new(),
            role: String::new(),
            include_hidden: true,
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Parse a lookup key of the form ``[:[domain:]role:]name``, where the
    /// name may be wrapped in backticks.
    ///
    /// A single prefix token is the role, with any domain.
    ///
    /// ```
    /// use doc_inventory::Query;
    ///
    /// let query = Query::parse(":function:`demo.run`").unwrap();
    /// assert_eq!(query.role, "function");
    /// assert_eq!(query.domain, "");
    /// assert_eq!(query.name, "demo.run");
    /// ```
    pub fn parse(key: &str) -> Result<Self> {
        if key.trim().is_empty() {
            return Err(InventoryError::argument("Lookup key must not be empty"));
        }
        let parts = split_spec(key)?;
        Ok(Self {
            name: parts.name.to_string(),
            domain: parts.domain.unwrap_or_default().to_string(),
            role: parts.role.unwrap_or_default().to_string(),
            include_hidden: true,
        })
    }

    /// Whether `item` passes the domain, role and visibility filters. The
    /// name is matched by the caller.
    pub(crate) fn accepts(&self, item: &InventoryItem) -> bool {
        (self.domain.is_empty() || self.domain == item.domain())
            && (self.role.is_empty() || self.role == item.role())
            && (self.include_hidden || !item.is_hidden())
    }
}

impl FromStr for Query {
    type Err = InventoryError;

    fn from_str(key: &str) -> Result<Self> {
        Self::parse(key)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.domain.is_empty(), self.role.is_empty()) {
            (true, true) => write!(f, "`{}`", self.name),
            (true, false) => write!(f, ":{}:`{}`", self.role, self.name),
            (false, true) => write!(f, ":{}:*:`{}`", self.domain, self.name),
            (false, false) => write!(f, ":{}:{}:`{}`", self.domain, self.role, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[rstest]
    #[case("Sphinx", "", "", "Sphinx")]
    #[case("`Sphinx`", "", "", "Sphinx")]
    #[case(":label:`Sphinx`", "", "label", "Sphinx")]
    #[case(":std:label:`Sphinx`", "std", "label", "Sphinx")]
    #[case(":py:method:`a.b`", "py", "method", "a.b")]
    #[case(":py:method:a.b", "py", "method", "a.b")]
    #[case(":cpp:function:ns::f", "cpp", "function", "ns::f")]
    fn parse_keys(
        #[case] key: &str,
        #[case] domain: &str,
        #[case] role: &str,
        #[case] name: &str,
    ) {
        let_assert!(Ok(query) = Query::parse(key));
        check!(query.domain == domain);
        check!(query.role == role);
        check!(query.name == name);
        check!(query.include_hidden);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case(":py:function:`unbalanced")]
    #[case(":py:function:")]
    #[case(":function:")]
    fn malformed_keys(#[case] key: &str) {
        let_assert!(Err(err) = Query::parse(key));
        check!(err.is_argument());
    }

    #[test]
    fn display_renders_key() {
        check!(Query::new("x").role("label").to_string() == ":label:`x`");
        check!(Query::new("x").domain("py").role("class").to_string() == ":py:class:`x`");
    }
}
