//! `shopcart-core`: cart domain building blocks.
//!
//! This crate contains **pure domain** types and quantity rules (no IO, no
//! HTTP, no rendering).

pub mod entity;
pub mod error;
pub mod id;
pub mod item;

pub use entity::{Entity, find_by_id};
pub use error::{DomainError, DomainResult};
pub use id::ItemId;
pub use item::{AmountPatch, CartItem, InventoryItem, NewCartItem};
