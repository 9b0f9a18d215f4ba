use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::ItemId;

/// Available stock for one content label (matches the `/inventory` shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub content: String,
    pub amount: u64,
}

impl InventoryItem {
    pub fn new(id: impl Into<ItemId>, content: impl Into<String>, amount: u64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            amount,
        }
    }

    /// Amount after one decrement, or `None` when already at zero.
    pub fn decremented_amount(&self) -> Option<u64> {
        self.amount.checked_sub(1)
    }

    /// Amount after one increment.
    pub fn incremented_amount(&self) -> DomainResult<u64> {
        self.amount.checked_add(1).ok_or_else(|| {
            DomainError::invariant(format!("amount of item {} would overflow", self.id))
        })
    }

    /// The cart line that moves the whole available amount, if any is left.
    pub fn to_cart_entry(&self) -> Option<NewCartItem> {
        (self.amount > 0).then(|| NewCartItem {
            content: self.content.clone(),
            amount: self.amount,
        })
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

/// One line in the cart (matches the `/cart` shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub content: String,
    pub amount: u64,
}

impl CartItem {
    pub fn new(id: impl Into<ItemId>, content: impl Into<String>, amount: u64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            amount,
        }
    }

    /// Amount after merging `extra` into this line.
    ///
    /// Adding the same content twice accumulates rather than overwrites.
    pub fn merged_amount(&self, extra: u64) -> DomainResult<u64> {
        self.amount.checked_add(extra).ok_or_else(|| {
            DomainError::invariant(format!("cart line {} amount would overflow", self.id))
        })
    }
}

impl Entity for CartItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

/// Body of a cart line creation (`POST /cart`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub content: String,
    pub amount: u64,
}

impl NewCartItem {
    pub fn new(content: impl Into<String>, amount: u64) -> DomainResult<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::validation("content cannot be empty"));
        }
        Ok(Self { content, amount })
    }
}

/// Partial update body (`PATCH /cart/{id}`, `PATCH /inventory/{id}`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPatch {
    pub amount: u64,
}
