//! reqwest-backed [`ShopApi`] implementation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use shopcart_core::{AmountPatch, CartItem, InventoryItem, ItemId, NewCartItem};

use crate::api::ShopApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/// HTTP client for the cart/inventory backend.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpShopClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpShopClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// GET with exponential backoff on transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.url(path);
        let mut delay = self.config.retry_delay;
        let max_retries = self.config.get_retries;

        let mut attempt = 0;
        loop {
            let req = self.http.get(&url).query(query);
            match send_json(req).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(%url, attempt, error = %e, "GET failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        send_json(self.http.patch(self.url(path)).json(body)).await
    }
}

/// Send once, check the status, decode the body.
async fn send_json<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> ApiResult<T> {
    let resp = checked(req).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn checked(req: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

impl ShopApi for HttpShopClient {
    async fn get_cart(&self) -> ApiResult<Vec<CartItem>> {
        self.get_json("/cart", &[]).await
    }

    async fn get_inventory(&self) -> ApiResult<Vec<InventoryItem>> {
        self.get_json("/inventory", &[]).await
    }

    async fn find_cart_by_content(&self, content: &str) -> ApiResult<Vec<CartItem>> {
        self.get_json("/cart", &[("content", content)]).await
    }

    async fn create_cart_item(&self, item: &NewCartItem) -> ApiResult<CartItem> {
        tracing::debug!(content = %item.content, amount = item.amount, "POST /cart");
        send_json(self.http.post(self.url("/cart")).json(item)).await
    }

    async fn update_cart_item(&self, id: ItemId, amount: u64) -> ApiResult<CartItem> {
        tracing::debug!(%id, amount, "PATCH cart line");
        self.patch_json(&format!("/cart/{id}"), &AmountPatch { amount }).await
    }

    async fn update_inventory(&self, id: ItemId, amount: u64) -> ApiResult<InventoryItem> {
        tracing::debug!(%id, amount, "PATCH inventory item");
        self.patch_json(&format!("/inventory/{id}"), &AmountPatch { amount }).await
    }

    async fn delete_from_cart(&self, id: ItemId) -> ApiResult<()> {
        tracing::debug!(%id, "DELETE cart line");
        let resp = checked(self.http.delete(self.url(&format!("/cart/{id}")))).await?;
        // Body shape varies between backends; drain it so the connection is reusable.
        let _ = resp.bytes().await?;
        Ok(())
    }
}
