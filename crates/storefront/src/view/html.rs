//! Markup render target with delegated click handling.
//!
//! The view owns three regions (inventory list, cart list, checkout button).
//! Rendering replaces a region's markup wholesale. Listeners are attached to
//! a region, not to rows: a click carries the clicked element's class and its
//! parent row's `data-id`, and each listener decides whether it cares.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use shopcart_core::{CartItem, InventoryItem, ItemId};

use super::{ActionHandler, CartView, CommandTarget, IdHandler, UiAction, UiEventPort, lock};

pub const DECREMENT_CLASS: &str = "decrement-btn";
pub const INCREMENT_CLASS: &str = "increment-btn";
pub const ADD_TO_CART_CLASS: &str = "add-to-cart-btn";
pub const DELETE_FROM_CART_CLASS: &str = "delete-from-cart-btn";
pub const CHECKOUT_CLASS: &str = "checkout-btn";

/// Failures kept between two renders; older ones are dropped first.
pub const MAX_NOTICES: usize = 5;

/// Container a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// `.inventory-container ul`
    InventoryList,
    /// `.cart-container ul`
    CartList,
    /// `.checkout-btn`
    CheckoutButton,
}

/// The element a click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    pub class: String,
    /// `data-id` of the enclosing `<li>`, if any.
    pub row_id: Option<String>,
}

impl ClickTarget {
    pub fn new(class: impl Into<String>, row_id: Option<String>) -> Self {
        Self {
            class: class.into(),
            row_id,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|c| c == class)
    }
}

type DelegatedListener = Box<dyn Fn(&ClickTarget) + Send + Sync>;

/// A failure shown above the lists until the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub at: DateTime<Utc>,
    pub message: String,
}

type PageSink = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Markup {
    inventory: String,
    cart: String,
    notices: Vec<Notice>,
    /// Reply to the last command line (help or a parse error).
    hint: Option<String>,
}

impl Markup {
    /// A fresh render supersedes whatever was shown about earlier attempts.
    fn clear_messages(&mut self) {
        self.notices.clear();
        self.hint = None;
    }
}

#[derive(Default)]
pub struct HtmlView {
    markup: Mutex<Markup>,
    listeners: Mutex<Vec<(Region, DelegatedListener)>>,
    sink: Option<PageSink>,
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the full page to `sink` after every completed render.
    pub fn with_sink(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::default()
        }
    }

    /// Current inner markup of `.inventory-container ul`.
    pub fn inventory_html(&self) -> String {
        lock(&self.markup).inventory.clone()
    }

    /// Current inner markup of `.cart-container ul`.
    pub fn cart_html(&self) -> String {
        lock(&self.markup).cart.clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.markup).notices.clone()
    }

    pub fn hint(&self) -> Option<String> {
        lock(&self.markup).hint.clone()
    }

    /// Full document with both containers and the checkout control.
    pub fn render_page(&self) -> String {
        let markup = lock(&self.markup);
        let mut html = String::with_capacity(markup.inventory.len() + markup.cart.len() + 512);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n");
        html.push_str("<title>Shopping Cart</title>\n</head>\n<body>\n");
        for notice in &markup.notices {
            html.push_str(&format!(
                "<p class=\"notice\" data-at=\"{}\">{}</p>\n",
                notice.at.to_rfc3339(),
                escape_html(&notice.message)
            ));
        }
        if let Some(hint) = &markup.hint {
            html.push_str(&format!("<p class=\"hint\">{}</p>\n", escape_html(hint)));
        }
        html.push_str("<div class=\"inventory-container\">\n<h2>Inventory</h2>\n<ul>");
        html.push_str(&markup.inventory);
        html.push_str("</ul>\n</div>\n<div class=\"cart-container\">\n<h2>Shopping Cart</h2>\n<ul>");
        html.push_str(&markup.cart);
        html.push_str("</ul>\n");
        html.push_str(&format!("<button class=\"{CHECKOUT_CLASS}\">Checkout</button>\n"));
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }

    /// Deliver a click to every listener attached to `region`.
    pub fn click(&self, region: Region, target: &ClickTarget) {
        let listeners = lock(&self.listeners);
        for (_, listener) in listeners.iter().filter(|(r, _)| *r == region) {
            listener(target);
        }
    }

    /// Click the control of a rendered row, as a user would.
    pub fn press(&self, action: UiAction) {
        let (region, class, id) = match action {
            UiAction::Decrement(id) => (Region::InventoryList, DECREMENT_CLASS, Some(id)),
            UiAction::Increment(id) => (Region::InventoryList, INCREMENT_CLASS, Some(id)),
            UiAction::AddToCart(id) => (Region::InventoryList, ADD_TO_CART_CLASS, Some(id)),
            UiAction::DeleteFromCart(id) => (Region::CartList, DELETE_FROM_CART_CLASS, Some(id)),
            UiAction::Checkout => (Region::CheckoutButton, CHECKOUT_CLASS, None),
        };
        self.click(region, &ClickTarget::new(class, id.map(|id| id.to_string())));
    }

    fn delegate(&self, region: Region, class: &'static str, handler: IdHandler) {
        let listener: DelegatedListener = Box::new(move |target: &ClickTarget| {
            if !target.has_class(class) {
                return;
            }
            let Some(raw) = target.row_id.as_deref() else {
                tracing::warn!(class, "click outside of a row");
                return;
            };
            match raw.parse::<ItemId>() {
                Ok(id) => handler(id),
                Err(e) => tracing::warn!(class, row_id = raw, error = %e, "ignoring click on malformed row"),
            }
        });
        lock(&self.listeners).push((region, listener));
    }
}

impl CartView for HtmlView {
    fn render_inventory(&self, items: &[InventoryItem]) {
        let mut html = String::new();
        for item in items {
            html.push_str(&format!(
                "<li data-id=\"{id}\">\n  {content}\n  <button class=\"{DECREMENT_CLASS}\">-</button>\n  <span class=\"amount\">{amount}</span>\n  <button class=\"{INCREMENT_CLASS}\">+</button>\n  <button class=\"{ADD_TO_CART_CLASS}\">Add to Cart</button>\n</li>",
                id = item.id,
                content = escape_html(&item.content),
                amount = item.amount,
            ));
        }
        let mut markup = lock(&self.markup);
        markup.clear_messages();
        markup.inventory = html;
    }

    fn render_cart(&self, items: &[CartItem]) {
        let mut html = String::new();
        for item in items {
            html.push_str(&format!(
                "<li data-id=\"{id}\">\n  {content} &nbsp; x &nbsp; {amount}\n  &nbsp;\n  <button class=\"{DELETE_FROM_CART_CLASS}\">Delete</button>\n</li>",
                id = item.id,
                content = escape_html(&item.content),
                amount = item.amount,
            ));
        }
        let mut markup = lock(&self.markup);
        markup.clear_messages();
        markup.cart = html;
    }

    fn notify_error(&self, message: &str) {
        {
            let mut markup = lock(&self.markup);
            if markup.notices.len() == MAX_NOTICES {
                markup.notices.remove(0);
            }
            markup.notices.push(Notice {
                at: Utc::now(),
                message: message.to_string(),
            });
        }
        self.flush();
    }

    fn flush(&self) {
        if let Some(sink) = &self.sink {
            sink(&self.render_page());
        }
    }
}

impl UiEventPort for HtmlView {
    fn on_decrement(&self, handler: IdHandler) {
        self.delegate(Region::InventoryList, DECREMENT_CLASS, handler);
    }

    fn on_increment(&self, handler: IdHandler) {
        self.delegate(Region::InventoryList, INCREMENT_CLASS, handler);
    }

    fn on_add_to_cart(&self, handler: IdHandler) {
        self.delegate(Region::InventoryList, ADD_TO_CART_CLASS, handler);
    }

    fn on_delete_from_cart(&self, handler: IdHandler) {
        self.delegate(Region::CartList, DELETE_FROM_CART_CLASS, handler);
    }

    fn on_checkout(&self, handler: ActionHandler) {
        // Anywhere on the button counts.
        let listener: DelegatedListener = Box::new(move |_: &ClickTarget| handler());
        lock(&self.listeners).push((Region::CheckoutButton, listener));
    }
}

impl CommandTarget for HtmlView {
    fn dispatch(&self, action: UiAction) {
        self.press(action);
    }

    fn reject(&self, message: &str) {
        lock(&self.markup).hint = Some(message.to_string());
        self.flush();
    }

    fn close(&self) {
        lock(&self.listeners).clear();
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
