use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolve once the process is asked to stop (SIGTERM / SIGINT, Ctrl-C elsewhere).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?; // Ctrl+C
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
            _ = tokio::signal::ctrl_c() => {}, // fallback
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// A token that is cancelled when a shutdown signal arrives.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::warn!("shutdown: signal listener failed: {e}; stopping");
        } else {
            tracing::info!("shutdown: signal received");
        }
        child.cancel();
    });
    token
}
