pub mod handlers;
pub mod models;
pub mod router;

use crate::catalog::CatalogSource;
use crate::store::StoreHandle;
use crate::templates::TemplateStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared context constructed once at startup and cloned into handlers.
/// Replaces ambient globals; everything a handler touches lives here.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogSource>,
    pub store: StoreHandle,
    pub templates: Arc<TemplateStore>,
    pub request_timeout: Duration,
}

pub struct ApiServer {
    listener: TcpListener,
    app: axum::Router,
}

impl ApiServer {
    /// Binds the listener up front so a port conflict aborts startup
    /// instead of surfacing later inside the serve task.
    pub async fn bind(state: AppState, port: u16) -> anyhow::Result<Self> {
        let app = router::build(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { listener, app })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the token is cancelled, then stops accepting new
    /// connections and drains in-flight requests before returning.
    pub async fn serve(self, cancel: CancellationToken) -> anyhow::Result<()> {
        tracing::info!("API server listening on http://{}", self.local_addr()?);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        Ok(())
    }
}
