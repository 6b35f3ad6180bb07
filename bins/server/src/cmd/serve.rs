use std::time::Duration;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use table_api_server::AppState;

use crate::config::{Effective, ServeArgs};
use crate::error::ServerError;
use crate::source;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("fello-admin starting");

    // --- Load config ---
    let config = Effective::new(&args.source, args.port)?;
    tracing::info!(config = %args.source.config, port = config.api_port, "loaded config");

    // --- Initial snapshot ---
    let state = AppState::load(source::from_config(&config))
        .await
        .map_err(ServerError::Source)?;

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- API server ---
    let mut api_handle = tokio::spawn(table_api_server::run(config.api_port, state, token.clone()));
    tracing::info!("server ready");

    // --- Ожидание Ctrl+C (или преждевременной остановки API, напр. bind error) ---
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        finished = &mut api_handle => return api_result(finished),
    }
    tracing::info!("shutting down...");
    token.cancel();

    // In-flight запросы получают до 5s на завершение.
    match tokio::time::timeout(Duration::from_secs(5), api_handle).await {
        Ok(finished) => api_result(finished)?,
        Err(_) => tracing::warn!("api server did not stop in time"),
    }

    tracing::info!("shutdown complete");
    Ok(())
}

fn api_result(finished: Result<Result<(), String>, JoinError>) -> Result<(), ServerError> {
    match finished {
        Ok(result) => result.map_err(ServerError::Api),
        Err(e) => Err(ServerError::Api(format!("api task: {e}"))),
    }
}
