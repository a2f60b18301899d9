use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_server::{config::IN_MEMORY, Config, ItemStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,todo_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = if config.db_path == IN_MEMORY {
        ItemStore::open_in_memory()?
    } else {
        ItemStore::open(&config.db_path)?
    };
    tracing::info!(db = %config.db_path, "store opened");

    if config.seed {
        let added = store.seed_if_empty().await?;
        tracing::info!(added, "seeded demo todos");
    }

    let router = todo_server::router(store, config.static_dir.as_deref());

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    todo_server::run(listener, router, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
