//! Application state: the two lists the page shows.

use shopcart_core::{CartItem, InventoryItem};

/// Callback fired after every write. It receives the state so it can re-read
/// whatever it needs; there is no diff.
pub type ChangeCallback = Box<dyn Fn(&ApplicationState) + Send + Sync>;

/// In-memory mirror of the backend's inventory and cart.
///
/// Writes replace a whole list and then notify the single subscriber
/// synchronously. No validation happens here.
#[derive(Default)]
pub struct ApplicationState {
    inventory: Vec<InventoryItem>,
    cart: Vec<CartItem>,
    on_change: Option<ChangeCallback>,
}

impl core::fmt::Debug for ApplicationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApplicationState")
            .field("inventory", &self.inventory)
            .field("cart", &self.cart)
            .field("subscribed", &self.on_change.is_some())
            .finish()
    }
}

impl ApplicationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    pub fn set_inventory(&mut self, inventory: Vec<InventoryItem>) {
        self.inventory = inventory;
        self.notify();
    }

    pub fn set_cart(&mut self, cart: Vec<CartItem>) {
        self.cart = cart;
        self.notify();
    }

    /// Register the change callback. Single slot: a later subscription
    /// replaces the earlier one.
    pub fn subscribe(&mut self, callback: ChangeCallback) {
        if self.on_change.is_some() {
            tracing::debug!("replacing existing state subscriber");
        }
        self.on_change = Some(callback);
    }

    fn notify(&self) {
        if let Some(callback) = &self.on_change {
            callback(self);
        }
    }
}
