//! `shopcart-storefront`
//!
//! **Responsibility:** the interactive shopping cart client.
//!
//! This crate provides:
//! - [`ApplicationState`], the in-memory mirror of inventory and cart
//! - Render/event ports and two front ends (markup and terminal)
//! - [`Controller`], which turns user actions into backend round-trips
//!
//! The backend remains the authority: every change is written remotely and
//! then re-read before it is shown.

pub mod config;
pub mod controller;
pub mod state;
pub mod view;

pub use config::{AppConfig, BackendKind, ConfigError, ViewKind};
pub use controller::{Controller, ControllerError, ControllerResult};
pub use state::ApplicationState;
pub use view::{CartView, CommandTarget, HtmlView, TerminalView, UiAction, UiEventPort};
