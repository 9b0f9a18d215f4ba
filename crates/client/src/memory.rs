//! In-memory backend for tests/dev.

use std::sync::{Mutex, MutexGuard};

use shopcart_core::{CartItem, InventoryItem, ItemId, NewCartItem};

use crate::api::ShopApi;
use crate::error::{ApiError, ApiResult};

/// A backend request, as recorded by [`InMemoryShop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetCart,
    GetInventory,
    FindCartByContent(String),
    CreateCartItem(NewCartItem),
    UpdateCartItem { id: ItemId, amount: u64 },
    UpdateInventory { id: ItemId, amount: u64 },
    DeleteFromCart(ItemId),
}

impl ApiCall {
    /// Whether the call changes backend state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ApiCall::CreateCartItem(_)
                | ApiCall::UpdateCartItem { .. }
                | ApiCall::UpdateInventory { .. }
                | ApiCall::DeleteFromCart(_)
        )
    }
}

type FailureRule = Box<dyn Fn(&ApiCall) -> bool + Send + Sync>;

#[derive(Default)]
struct ShopData {
    inventory: Vec<InventoryItem>,
    cart: Vec<CartItem>,
    next_cart_id: u64,
    calls: Vec<ApiCall>,
    failure: Option<FailureRule>,
}

/// Backend that keeps both collections in process.
///
/// - No IO
/// - Every request is appended to a call log
/// - Requests can be made to fail on demand
///
/// It follows the same rules as the REST backend: ids are assigned on
/// creation, unknown ids answer 404, content filtering is exact match.
pub struct InMemoryShop {
    data: Mutex<ShopData>,
}

impl core::fmt::Debug for InMemoryShop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let data = self.lock();
        f.debug_struct("InMemoryShop")
            .field("inventory", &data.inventory)
            .field("cart", &data.cart)
            .field("calls", &data.calls.len())
            .finish()
    }
}

impl Default for InMemoryShop {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl InMemoryShop {
    pub fn new(inventory: Vec<InventoryItem>, cart: Vec<CartItem>) -> Self {
        let next_cart_id = cart.iter().map(|line| line.id.get()).max().unwrap_or(0) + 1;
        Self {
            data: Mutex::new(ShopData {
                inventory,
                cart,
                next_cart_id,
                ..ShopData::default()
            }),
        }
    }

    /// A small fruit stand used by the `memory` backend of the binary.
    pub fn with_demo_inventory() -> Self {
        Self::new(
            vec![
                InventoryItem::new(1, "apple", 5),
                InventoryItem::new(2, "banana", 3),
                InventoryItem::new(3, "cherry", 12),
                InventoryItem::new(4, "durian", 0),
                InventoryItem::new(5, "elderberry", 8),
            ],
            Vec::new(),
        )
    }

    /// Make every future request matching `rule` fail with a 503.
    ///
    /// Failing requests are still logged but leave the data untouched.
    pub fn fail_when(&self, rule: impl Fn(&ApiCall) -> bool + Send + Sync + 'static) {
        self.lock().failure = Some(Box::new(rule));
    }

    pub fn clear_failures(&self) {
        self.lock().failure = None;
    }

    /// Requests received so far, oldest first.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn inventory_snapshot(&self) -> Vec<InventoryItem> {
        self.lock().inventory.clone()
    }

    pub fn cart_snapshot(&self) -> Vec<CartItem> {
        self.lock().cart.clone()
    }

    // A poisoned lock only means another test thread panicked mid-call; the
    // data itself is still consistent enough to keep serving.
    fn lock(&self) -> MutexGuard<'_, ShopData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, call: ApiCall) -> ApiResult<MutexGuard<'_, ShopData>> {
        let mut data = self.lock();
        let fail = data.failure.as_ref().is_some_and(|rule| rule(&call));
        tracing::trace!(?call, fail, "in-memory request");
        data.calls.push(call);

        if fail {
            return Err(ApiError::Server {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(data)
    }
}

fn not_found(kind: &str, id: ItemId) -> ApiError {
    ApiError::Server {
        status: 404,
        body: format!("{kind} {id} not found"),
    }
}

impl ShopApi for InMemoryShop {
    async fn get_cart(&self) -> ApiResult<Vec<CartItem>> {
        let data = self.begin(ApiCall::GetCart)?;
        Ok(data.cart.clone())
    }

    async fn get_inventory(&self) -> ApiResult<Vec<InventoryItem>> {
        let data = self.begin(ApiCall::GetInventory)?;
        Ok(data.inventory.clone())
    }

    async fn find_cart_by_content(&self, content: &str) -> ApiResult<Vec<CartItem>> {
        let data = self.begin(ApiCall::FindCartByContent(content.to_string()))?;
        Ok(data
            .cart
            .iter()
            .filter(|line| line.content == content)
            .cloned()
            .collect())
    }

    async fn create_cart_item(&self, item: &NewCartItem) -> ApiResult<CartItem> {
        let mut data = self.begin(ApiCall::CreateCartItem(item.clone()))?;
        let line = CartItem::new(data.next_cart_id, item.content.clone(), item.amount);
        data.next_cart_id += 1;
        data.cart.push(line.clone());
        Ok(line)
    }

    async fn update_cart_item(&self, id: ItemId, amount: u64) -> ApiResult<CartItem> {
        let mut data = self.begin(ApiCall::UpdateCartItem { id, amount })?;
        let line = data
            .cart
            .iter_mut()
            .find(|line| line.id == id)
            .ok_or_else(|| not_found("cart line", id))?;
        line.amount = amount;
        Ok(line.clone())
    }

    async fn update_inventory(&self, id: ItemId, amount: u64) -> ApiResult<InventoryItem> {
        let mut data = self.begin(ApiCall::UpdateInventory { id, amount })?;
        let item = data
            .inventory
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| not_found("inventory item", id))?;
        item.amount = amount;
        Ok(item.clone())
    }

    async fn delete_from_cart(&self, id: ItemId) -> ApiResult<()> {
        let mut data = self.begin(ApiCall::DeleteFromCart(id))?;
        let before = data.cart.len();
        data.cart.retain(|line| line.id != id);
        if data.cart.len() == before {
            return Err(not_found("cart line", id));
        }
        Ok(())
    }
}
