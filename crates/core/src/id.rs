//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Identifier of a product (and of the cart line item that snapshots it).
///
/// Opaque to the client: the data source may issue small counters (`5`),
/// plain strings, or MongoDB object ids. All of them normalize to the same
/// textual form so equality is stable across fetches and reloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create an identifier from its textual form. Blank identifiers are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("ProductId: blank identifier"));
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Every identifier shape the data source has been seen to emit.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match WireId::deserialize(deserializer)? {
            WireId::Text(s) => s,
            WireId::Unsigned(n) => n.to_string(),
            WireId::Signed(n) => n.to_string(),
            WireId::ObjectId { oid } => oid,
        };
        ProductId::new(text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_textual_ids_compare_equal() {
        let from_number: ProductId = serde_json::from_str("5").unwrap();
        let from_text: ProductId = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(from_number, ProductId::from(5));
    }

    #[test]
    fn mongo_object_id_is_unwrapped() {
        let id: ProductId =
            serde_json::from_str(r#"{"$oid": "64f1c2a9e4b0a1b2c3d4e5f6"}"#).unwrap();
        assert_eq!(id.as_str(), "64f1c2a9e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(ProductId::new("   ").is_err());
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
        assert!("".parse::<ProductId>().is_err());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(ProductId::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&ProductId::from(42)).unwrap();
        assert_eq!(json, "\"42\"");
    }
}
