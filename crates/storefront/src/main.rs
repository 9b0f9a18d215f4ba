//! `shopcart` entry point.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use shopcart_client::{HttpShopClient, InMemoryShop, ShopApi};
use shopcart_storefront::view::read_commands;
use shopcart_storefront::{
    AppConfig, BackendKind, CartView, CommandTarget, Controller, HtmlView, TerminalView, UiEventPort,
    ViewKind,
};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopcart_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        api_url = %config.client.base_url,
        backend = ?config.backend,
        view = ?config.view,
        "starting shopcart"
    );

    match config.backend {
        BackendKind::Http => {
            let api = HttpShopClient::new(config.client.clone()).context("failed to build HTTP client")?;
            with_view(api, config.view).await
        }
        BackendKind::Memory => with_view(InMemoryShop::with_demo_inventory(), config.view).await,
    }
}

async fn with_view<A: ShopApi>(api: A, kind: ViewKind) -> anyhow::Result<()> {
    match kind {
        ViewKind::Terminal => {
            let view = Arc::new(TerminalView::new(std::io::stdout()));
            view.reject(shopcart_storefront::view::terminal::HELP);
            serve(api, view).await
        }
        ViewKind::Html => {
            let view = Arc::new(HtmlView::with_sink(|page: &str| {
                let mut out = std::io::stdout().lock();
                let result = match out.write_all(page.as_bytes()) {
                    Ok(()) => out.flush(),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    tracing::warn!(error = %e, "failed to write page");
                }
            }));
            serve(api, view).await
        }
    }
}

async fn serve<A, V>(api: A, view: Arc<V>) -> anyhow::Result<()>
where
    A: ShopApi,
    V: CartView + UiEventPort + CommandTarget + 'static,
{
    let mut controller = Controller::new(api, Arc::clone(&view));
    controller.bootstrap(&*view).await;

    let input = Arc::clone(&view);
    let reader = tokio::spawn(async move {
        read_commands(BufReader::new(tokio::io::stdin()), &*input).await
    });

    controller.run().await;

    reader
        .await
        .context("command reader task failed")?
        .context("failed to read commands from stdin")?;

    tracing::info!("shopcart stopped");
    Ok(())
}
