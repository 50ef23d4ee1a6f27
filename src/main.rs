use clap::Parser;
use hive_api::{app, config::Config, errors::Result, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind = config.bind.clone();
    info!(
        comments = config.features.comments,
        reactions = config.features.reactions,
        documents = config.features.documents,
        gallery = config.features.gallery,
        "Starting server"
    );
    let state = AppState::init(config).await?;

    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
    info!("Serving hive api at http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
