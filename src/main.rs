use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nexus_eam::db::create_pool;
use nexus_eam::routes::build_router;
use nexus_eam::services::{AuthService, InventoryService, TopologyService};
use nexus_eam::storage::LocalImageStore;
use nexus_eam::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_eam=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let auth = AuthService::new(
        pool.clone(),
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    );
    auth.seed_default_admin().await?;

    let state = AppState {
        inventory: InventoryService::new(pool.clone()),
        topology: TopologyService::new(pool.clone()),
        auth,
        images: LocalImageStore::new(config.upload_dir.clone()),
    };

    let app = build_router(state);
    let addr = config.server_addr();
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
