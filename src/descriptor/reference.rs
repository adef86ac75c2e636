//! References from outputs to resolved data sources.
//!
//! A reference has the form `data.<type>.<name>.<attribute>`. Map-typed
//! attributes may be indexed one level further, e.g.
//! `data.aws_vpc.default.tags.Name`. The whole expression may optionally be
//! wrapped in `${ ... }`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("identifier regex is valid"));

/// Address of a declared data source, e.g. `data.aws_vpc.default`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataAddress {
    /// Data source type (`aws_vpc`)
    pub kind: String,
    /// Local name given in the descriptor (`default`)
    pub name: String,
}

impl DataAddress {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DataAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data.{}.{}", self.kind, self.name)
    }
}

/// A parsed `data.<type>.<name>.<attribute>[.<key>]` expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    /// The data source being referenced
    pub address: DataAddress,
    /// Top-level attribute name
    pub attribute: String,
    /// Key into a map attribute, if any
    pub key: Option<String>,
}

impl Reference {
    /// Parse a reference expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidReference {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        let trimmed = expression.trim();
        let inner = match trimmed.strip_prefix("${") {
            Some(rest) => rest
                .strip_suffix('}')
                .ok_or_else(|| invalid("unterminated '${'"))?
                .trim(),
            None => trimmed,
        };

        let parts: Vec<&str> = inner.split('.').collect();
        if parts.first() != Some(&"data") {
            return Err(invalid("only 'data.<type>.<name>.<attribute>' references are supported"));
        }
        if parts.len() < 4 {
            return Err(invalid("expected 'data.<type>.<name>.<attribute>'"));
        }
        if parts.len() > 5 {
            return Err(invalid("too many path segments"));
        }
        if let Some(bad) = parts[1..].iter().find(|p| !IDENT.is_match(p)) {
            return Err(invalid(&format!("'{}' is not a valid identifier", bad)));
        }

        Ok(Self {
            address: DataAddress::new(parts[1], parts[2]),
            attribute: parts[3].to_string(),
            key: parts.get(4).map(|k| (*k).to_string()),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.attribute)?;
        if let Some(key) = &self.key {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Reference {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Reference> for String {
    fn from(value: Reference) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_reference() {
        let r = Reference::parse("data.aws_vpc.default.id").unwrap();
        assert_eq!(r.address, DataAddress::new("aws_vpc", "default"));
        assert_eq!(r.attribute, "id");
        assert_eq!(r.key, None);
        assert_eq!(r.to_string(), "data.aws_vpc.default.id");
        assert_eq!(r.address.to_string(), "data.aws_vpc.default");
    }

    #[test]
    fn test_parse_interpolated_and_keyed() {
        let r = Reference::parse("${ data.aws_vpc.main.tags.Name }").unwrap();
        assert_eq!(r.attribute, "tags");
        assert_eq!(r.key.as_deref(), Some("Name"));
        assert_eq!(r.to_string(), "data.aws_vpc.main.tags.Name");
    }

    #[test]
    fn test_reject_bad_references() {
        for bad in [
            "aws_vpc.default.id",
            "data.aws_vpc.default",
            "data.aws_vpc..id",
            "${data.aws_vpc.default.id",
            "data.aws_vpc.default.tags.a.b",
            "var.region",
        ] {
            assert!(Reference::parse(bad).is_err(), "{} should fail", bad);
        }
    }
}
