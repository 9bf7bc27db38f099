//! OS signal handling for long-running commands.

/// Wait for Ctrl-C (SIGINT).
pub async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    Ok(())
}
