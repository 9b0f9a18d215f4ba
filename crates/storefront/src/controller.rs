//! Controller: wires the view to the backend and keeps state in sync.
//!
//! Every user action follows the same shape: issue the write, re-fetch the
//! affected list(s), assign into state (which re-renders). State is only
//! written from a successful fetch, so a failed action leaves it untouched.

use std::sync::Arc;

use shopcart_client::{ApiError, ShopApi};
use shopcart_core::{DomainError, ItemId, find_by_id};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::state::ApplicationState;
use crate::view::{CartView, UiAction, UiEventPort};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

pub struct Controller<A, V> {
    api: A,
    view: Arc<V>,
    state: ApplicationState,
    actions_tx: Option<mpsc::UnboundedSender<UiAction>>,
    actions_rx: mpsc::UnboundedReceiver<UiAction>,
}

impl<A, V> Controller<A, V>
where
    A: ShopApi,
    V: CartView + 'static,
{
    pub fn new(api: A, view: Arc<V>) -> Self {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            view,
            state: ApplicationState::new(),
            actions_tx: Some(actions_tx),
            actions_rx,
        }
    }

    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Subscribe rendering to state changes, attach handlers for all five
    /// user actions to `events`, then load both lists.
    ///
    /// Handlers only enqueue; [`Controller::run`] performs the work. Calling
    /// this twice is a no-op the second time.
    pub async fn bootstrap<E>(&mut self, events: &E)
    where
        E: UiEventPort + ?Sized,
    {
        let Some(tx) = self.actions_tx.take() else {
            tracing::warn!("controller already bootstrapped");
            return;
        };

        let view = Arc::clone(&self.view);
        self.state.subscribe(Box::new(move |state: &ApplicationState| {
            view.render_inventory(state.inventory());
            view.render_cart(state.cart());
            view.flush();
        }));

        events.on_decrement(enqueue(&tx, UiAction::Decrement));
        events.on_increment(enqueue(&tx, UiAction::Increment));
        events.on_add_to_cart(enqueue(&tx, UiAction::AddToCart));
        events.on_delete_from_cart(enqueue(&tx, UiAction::DeleteFromCart));
        let checkout_tx = tx.clone();
        events.on_checkout(Box::new(move || send(&checkout_tx, UiAction::Checkout)));
        drop(tx);

        tracing::info!("storefront bootstrapped");
        if let Err(e) = self.init().await {
            self.report("loading the shop", &e);
        }
    }

    /// Process queued actions one at a time until every event source has
    /// detached.
    pub async fn run(&mut self) {
        while let Some(action) = self.actions_rx.recv().await {
            self.dispatch(action).await;
        }
        tracing::info!("action queue closed");
    }

    /// Perform one action, reporting a failure to the view.
    pub async fn dispatch(&mut self, action: UiAction) {
        if let Err(e) = self.handle(action).await {
            self.report(&action.to_string(), &e);
        }
    }

    pub async fn handle(&mut self, action: UiAction) -> ControllerResult<()> {
        match action {
            UiAction::Decrement(id) => self.decrement(id).await,
            UiAction::Increment(id) => self.increment(id).await,
            UiAction::AddToCart(id) => self.add_to_cart(id).await,
            UiAction::DeleteFromCart(id) => self.delete_from_cart(id).await,
            UiAction::Checkout => self.checkout().await,
        }
    }

    /// Fetch both lists concurrently and assign whichever arrived.
    pub async fn init(&mut self) -> ControllerResult<()> {
        let (inventory, cart) = tokio::join!(self.api.get_inventory(), self.api.get_cart());

        let mut first_error = None;
        match inventory {
            Ok(items) => self.state.set_inventory(items),
            Err(e) => first_error = Some(e),
        }
        match cart {
            Ok(lines) => self.state.set_cart(lines),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Lower an item's amount by one; does nothing at zero.
    pub async fn decrement(&mut self, id: ItemId) -> ControllerResult<()> {
        let item = find_by_id(self.state.inventory(), id)?;
        let Some(amount) = item.decremented_amount() else {
            tracing::debug!(%id, "amount already zero");
            return Ok(());
        };

        self.api.update_inventory(id, amount).await?;
        self.refresh_inventory().await
    }

    /// Raise an item's amount by one.
    pub async fn increment(&mut self, id: ItemId) -> ControllerResult<()> {
        let amount = find_by_id(self.state.inventory(), id)?.incremented_amount()?;

        self.api.update_inventory(id, amount).await?;
        self.refresh_inventory().await
    }

    /// Move the item's whole available amount into the cart.
    pub async fn add_to_cart(&mut self, id: ItemId) -> ControllerResult<()> {
        let Some(entry) = find_by_id(self.state.inventory(), id)?.to_cart_entry() else {
            tracing::debug!(%id, "nothing to add");
            return Ok(());
        };

        self.api.add_to_cart(&entry).await?;
        if let Err(e) = self.api.update_inventory(id, 0).await {
            // The cart line is already written; there is no cross-resource rollback.
            // Re-read the cart so the page shows the line the server kept.
            tracing::warn!(%id, content = %entry.content, error = %e, "cart updated but inventory not zeroed");
            if let Err(refresh) = self.refresh_cart().await {
                tracing::warn!(error = %refresh, "failed to refresh cart after partial transfer");
            }
            return Err(e.into());
        }

        tracing::info!(%id, content = %entry.content, amount = entry.amount, "moved to cart");
        self.refresh_inventory().await?;
        self.refresh_cart().await
    }

    /// Remove one cart line.
    pub async fn delete_from_cart(&mut self, id: ItemId) -> ControllerResult<()> {
        self.api.delete_from_cart(id).await?;
        self.refresh_cart().await
    }

    /// Empty the cart, then refresh both lists.
    pub async fn checkout(&mut self) -> ControllerResult<()> {
        let removed = self.api.checkout().await?;
        tracing::info!(removed, "checked out");

        self.refresh_cart().await?;
        self.refresh_inventory().await
    }

    async fn refresh_inventory(&mut self) -> ControllerResult<()> {
        let inventory = self.api.get_inventory().await?;
        self.state.set_inventory(inventory);
        Ok(())
    }

    async fn refresh_cart(&mut self) -> ControllerResult<()> {
        let cart = self.api.get_cart().await?;
        self.state.set_cart(cart);
        Ok(())
    }

    fn report(&self, what: &str, err: &ControllerError) {
        tracing::warn!(error = %err, "{what} failed");
        self.view.notify_error(&format!("{what} failed: {err}"));
    }
}

fn send(tx: &mpsc::UnboundedSender<UiAction>, action: UiAction) {
    if tx.send(action).is_err() {
        tracing::warn!(%action, "controller stopped; dropping action");
    }
}

fn enqueue(
    tx: &mpsc::UnboundedSender<UiAction>,
    wrap: fn(ItemId) -> UiAction,
) -> crate::view::IdHandler {
    let tx = tx.clone();
    Box::new(move |id: ItemId| send(&tx, wrap(id)))
}
