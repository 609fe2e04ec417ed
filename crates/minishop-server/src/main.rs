mod api;
mod middleware;

use std::sync::Arc;

use minishop_core::Product;
use minishop_store::{Catalog, JsonFileStore, KeyedStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = minishop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if !config.catalog_path.exists() {
        tracing::warn!(
            path = %config.catalog_path.display(),
            "catalog document not found; product requests will fail until it exists"
        );
    }

    let store: Arc<dyn KeyedStore<Product>> = Arc::new(JsonFileStore::<Product>::new(&config.catalog_path));
    let state = AppState {
        catalog: Arc::new(Catalog::new(store)),
    };
    let app = build_app(state, config.public_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        env = %config.env,
        catalog = %config.catalog_path.display(),
        "server running at http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
