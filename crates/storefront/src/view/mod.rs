//! Render and event ports, plus the concrete front ends.
//!
//! The controller only ever talks to these traits:
//! - [`CartView`] draws the two lists and shows failures
//! - [`UiEventPort`] lets the controller attach handlers for user actions
//! - [`CommandTarget`] is how a text command stream drives a front end

pub mod html;
pub mod terminal;

use std::sync::Mutex;

use shopcart_core::{CartItem, InventoryItem, ItemId};

pub use html::{HtmlView, Region};
pub use terminal::{Command, TerminalView, parse_command, read_commands};

/// Handler for row-level actions; receives the row's id.
pub type IdHandler = Box<dyn Fn(ItemId) + Send + Sync>;

/// Handler for actions without a row (checkout).
pub type ActionHandler = Box<dyn Fn() + Send + Sync>;

/// A user action, after the front end has resolved which row it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Decrement(ItemId),
    Increment(ItemId),
    AddToCart(ItemId),
    DeleteFromCart(ItemId),
    Checkout,
}

impl core::fmt::Display for UiAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UiAction::Decrement(id) => write!(f, "decrement item {id}"),
            UiAction::Increment(id) => write!(f, "increment item {id}"),
            UiAction::AddToCart(id) => write!(f, "add item {id} to cart"),
            UiAction::DeleteFromCart(id) => write!(f, "delete cart line {id}"),
            UiAction::Checkout => f.write_str("checkout"),
        }
    }
}

/// Render target.
pub trait CartView: Send + Sync {
    /// Replace the inventory list with one row per item.
    fn render_inventory(&self, items: &[InventoryItem]);

    /// Replace the cart list with one row per line.
    fn render_cart(&self, items: &[CartItem]);

    /// Show a failure to the user.
    fn notify_error(&self, message: &str);

    /// Called once both lists have been rendered for a state change.
    fn flush(&self) {}
}

/// Event source. Every registration appends: registering the same handler
/// twice runs it twice per action.
pub trait UiEventPort {
    fn on_decrement(&self, handler: IdHandler);
    fn on_increment(&self, handler: IdHandler);
    fn on_add_to_cart(&self, handler: IdHandler);
    fn on_delete_from_cart(&self, handler: IdHandler);
    fn on_checkout(&self, handler: ActionHandler);
}

/// Something a parsed command line can be delivered to.
pub trait CommandTarget: Send + Sync {
    /// Deliver a user action as if it had been clicked/typed.
    fn dispatch(&self, action: UiAction);

    /// Tell the user their input was not understood.
    fn reject(&self, message: &str);

    /// Detach every listener. Once detached, the controller's action queue
    /// drains and closes.
    fn close(&self);
}

/// Per-action listener lists for front ends without delegation.
#[derive(Default)]
pub struct ListenerSet {
    decrement: Vec<IdHandler>,
    increment: Vec<IdHandler>,
    add_to_cart: Vec<IdHandler>,
    delete_from_cart: Vec<IdHandler>,
    checkout: Vec<ActionHandler>,
}

impl ListenerSet {
    /// Run every listener registered for `action`. Returns how many ran.
    pub fn emit(&self, action: UiAction) -> usize {
        let (handlers, id) = match action {
            UiAction::Decrement(id) => (&self.decrement, id),
            UiAction::Increment(id) => (&self.increment, id),
            UiAction::AddToCart(id) => (&self.add_to_cart, id),
            UiAction::DeleteFromCart(id) => (&self.delete_from_cart, id),
            UiAction::Checkout => {
                self.checkout.iter().for_each(|handler| handler());
                return self.checkout.len();
            }
        };
        handlers.iter().for_each(|handler| handler(id));
        handlers.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// [`UiEventPort`] over a mutex-guarded [`ListenerSet`].
impl UiEventPort for Mutex<ListenerSet> {
    fn on_decrement(&self, handler: IdHandler) {
        lock(self).decrement.push(handler);
    }

    fn on_increment(&self, handler: IdHandler) {
        lock(self).increment.push(handler);
    }

    fn on_add_to_cart(&self, handler: IdHandler) {
        lock(self).add_to_cart.push(handler);
    }

    fn on_delete_from_cart(&self, handler: IdHandler) {
        lock(self).delete_from_cart.push(handler);
    }

    fn on_checkout(&self, handler: ActionHandler) {
        lock(self).checkout.push(handler);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> IdHandler) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |tag: &str| -> IdHandler {
            let sink = Arc::clone(&sink);
            let tag = tag.to_string();
            Box::new(move |id: ItemId| sink.lock().unwrap().push(format!("{tag} {id}")))
        };
        (log, make)
    }

    #[test]
    fn emit_routes_to_matching_listeners_only() {
        let listeners = Mutex::new(ListenerSet::default());
        let (log, make) = recorder();
        listeners.on_decrement(make("dec"));
        listeners.on_add_to_cart(make("add"));

        let ran = lock(&listeners).emit(UiAction::AddToCart(ItemId::new(3)));

        assert_eq!(ran, 1);
        assert_eq!(*log.lock().unwrap(), vec!["add 3".to_string()]);
    }

    #[test]
    fn double_registration_double_invokes() {
        let listeners = Mutex::new(ListenerSet::default());
        let (log, make) = recorder();
        listeners.on_increment(make("inc"));
        listeners.on_increment(make("inc"));

        lock(&listeners).emit(UiAction::Increment(ItemId::new(1)));

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn clear_detaches_everything() {
        let listeners = Mutex::new(ListenerSet::default());
        listeners.on_checkout(Box::new(|| panic!("detached listener ran")));

        lock(&listeners).clear();

        assert_eq!(lock(&listeners).emit(UiAction::Checkout), 0);
    }

    #[test]
    fn actions_describe_themselves() {
        assert_eq!(UiAction::AddToCart(ItemId::new(4)).to_string(), "add item 4 to cart");
        assert_eq!(UiAction::Checkout.to_string(), "checkout");
    }
}
