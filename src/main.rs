use clap::Parser;
use tracing_subscriber::EnvFilter;

use authgate::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env if present so DATABASE_URL, SECURITY_* etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = authgate::cli::run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
