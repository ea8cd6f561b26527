use tokio_util::sync::CancellationToken;

/// Returns a token cancelled on Ctrl-C. A running execution watches it and
/// abandons its wait, cleaning up before the process exits.
pub fn install_interrupt_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Received Ctrl-C, abandoning current execution");
                token_clone.cancel();
            }
            Err(e) => tracing::warn!("Failed to install Ctrl-C handler: {}", e),
        }
    });

    token
}
