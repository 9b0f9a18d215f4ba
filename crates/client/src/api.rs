//! Backend port: one method per REST call plus the composed cart flows.

use std::future::Future;

use futures::future::join_all;
use shopcart_core::{CartItem, InventoryItem, ItemId, NewCartItem};

use crate::error::ApiResult;

/// Operations against the cart/inventory backend.
///
/// Implementors provide the raw REST calls; `add_to_cart` and `checkout`
/// are built on top of them and normally should not be overridden.
pub trait ShopApi: Send + Sync {
    /// `GET /cart`
    fn get_cart(&self) -> impl Future<Output = ApiResult<Vec<CartItem>>> + Send;

    /// `GET /inventory`
    fn get_inventory(&self) -> impl Future<Output = ApiResult<Vec<InventoryItem>>> + Send;

    /// `GET /cart?content=<content>`
    fn find_cart_by_content(
        &self,
        content: &str,
    ) -> impl Future<Output = ApiResult<Vec<CartItem>>> + Send;

    /// `POST /cart`
    fn create_cart_item(
        &self,
        item: &NewCartItem,
    ) -> impl Future<Output = ApiResult<CartItem>> + Send;

    /// `PATCH /cart/{id}` with `{amount}`
    fn update_cart_item(
        &self,
        id: ItemId,
        amount: u64,
    ) -> impl Future<Output = ApiResult<CartItem>> + Send;

    /// `PATCH /inventory/{id}` with `{amount}`. Bounds are the caller's concern.
    fn update_inventory(
        &self,
        id: ItemId,
        amount: u64,
    ) -> impl Future<Output = ApiResult<InventoryItem>> + Send;

    /// `DELETE /cart/{id}`. The response body is discarded.
    fn delete_from_cart(&self, id: ItemId) -> impl Future<Output = ApiResult<()>> + Send;

    /// Upsert a cart line.
    ///
    /// The backend's content filter decides what matches: if it returns any
    /// line, the first one's amount becomes `existing + item.amount`;
    /// otherwise a new line is created. Returns the updated or created line.
    fn add_to_cart(&self, item: &NewCartItem) -> impl Future<Output = ApiResult<CartItem>> + Send {
        async move {
            let existing = self.find_cart_by_content(&item.content).await?;

            match existing.into_iter().next() {
                Some(line) => {
                    let amount = line.merged_amount(item.amount)?;
                    tracing::debug!(id = %line.id, amount, "merging into existing cart line");
                    self.update_cart_item(line.id, amount).await
                }
                None => {
                    tracing::debug!(content = %item.content, amount = item.amount, "creating cart line");
                    self.create_cart_item(item).await
                }
            }
        }
    }

    /// Delete every cart line.
    ///
    /// All deletions are issued at once and awaited together. If any fails
    /// the first error is returned; deletions that already succeeded stay
    /// applied. Returns the number of lines removed.
    fn checkout(&self) -> impl Future<Output = ApiResult<usize>> + Send {
        async move {
            let lines = self.get_cart().await?;
            let results = join_all(lines.iter().map(|line| self.delete_from_cart(line.id))).await;

            let total = results.len();
            let mut first_error = None;
            let mut failed = 0usize;
            for result in results {
                if let Err(e) = result {
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }

            match first_error {
                Some(err) => {
                    tracing::warn!(failed, total, "checkout left cart lines behind");
                    Err(err)
                }
                None => Ok(total),
            }
        }
    }
}
