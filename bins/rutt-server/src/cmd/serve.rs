use tokio_util::sync::CancellationToken;

use rutt_engine::Tracker;

use crate::cli::Cli;
use crate::error::ServerError;

pub async fn run(args: Cli) -> Result<(), ServerError> {
    if let Some(path) = &args.config {
        tracing::info!(config = %path, "loading configuration");
    }
    let config = args.resolve()?;

    tracing::info!(store = %config.store.url, "bootstrapping store");
    let tracker = Tracker::bootstrap(&config.store).await?;

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    let addr = config.listen_addr();
    let api_tracker = tracker.clone();
    let api_token = token.clone();
    let mut api_handle =
        tokio::spawn(async move { rutt_api_server::run(&addr, api_tracker, api_token).await });

    tracing::info!("rutt-server started, press Ctrl+C to stop");

    let served = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutting down...");
            token.cancel();
            api_handle.await?
        }
        result = &mut api_handle => result?,
    };

    // Close the store even when the listener failed.
    tracker.shutdown().await?;
    served.map_err(ServerError::Api)
}
