use clap::Parser;
use content_api::{cli::Cli, AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("content_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Built once here and passed down; nothing reads the environment later
    let config = AppConfig::from_env();
    tracing::info!("Starting Content API in {:?} mode", config.environment);

    if let Err(e) = content_api::cli::run(cli, config).await {
        tracing::error!("{e:?}");
        std::process::exit(1);
    }

    Ok(())
}
