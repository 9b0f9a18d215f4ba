//! Server-assigned identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an inventory item or cart line.
///
/// Both collections are keyed by integers the backend assigns on creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ItemId> for u64 {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("ItemId {s:?}: {e}")))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_ids() {
        assert_eq!("42".parse::<ItemId>().unwrap(), ItemId::new(42));
        assert_eq!(" 7 ".parse::<ItemId>().unwrap(), ItemId::new(7));
    }

    #[test]
    fn rejects_non_integer_ids() {
        match "abc".parse::<ItemId>() {
            Err(DomainError::InvalidId(msg)) => assert!(msg.contains("abc")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
        assert!("-1".parse::<ItemId>().is_err());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&ItemId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
