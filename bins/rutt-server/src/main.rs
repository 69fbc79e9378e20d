mod cli;
mod cmd;
mod error;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = cmd::serve::run(cli).await {
        tracing::error!(error = %e, "rutt-server failed");
        std::process::exit(1);
    }
}
