use tokio_util::sync::CancellationToken;

/// Exit status for a forced stop (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

/// Returns a token that is cancelled on the first Ctrl-C.
///
/// The token stays cancelled, so an interrupt that lands before polling
/// starts still cancels the submitted job. A second Ctrl-C ends the
/// process at once.
pub fn install_interrupt_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install SIGINT handler");
            return;
        }
        tracing::info!("Received SIGINT, cancelling job");
        token_clone.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received second SIGINT, exiting");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    token
}
