//! `shopcart-client`
//!
//! **Responsibility:** talk to the cart/inventory REST backend.
//!
//! This crate provides:
//! - The [`ShopApi`] port (one method per REST call, plus the composed
//!   add-to-cart and checkout flows)
//! - [`HttpShopClient`], the reqwest-backed implementation
//! - [`InMemoryShop`], an in-process backend for tests and the demo mode
//!
//! No operation here touches local UI state; that is the controller's job.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;

pub use api::ShopApi;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{ApiError, ApiResult};
pub use http::HttpShopClient;
pub use memory::{ApiCall, InMemoryShop};
