use mineplace::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let settings = Settings::from_env()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Providers
    let db = Database::connect(&settings.db_url).await?;
    let storage = FileSystemStorage::new(&settings.files_dir);

    // Build
    let app = MineplaceServer::new(settings.server.clone()).build(db, storage);

    // Serve
    let addr = settings.bind_address();
    tracing::info!("Server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
