use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancels `cancellation` on Ctrl-C. Returns early if something else cancelled it first.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::detect_shutdown;

    #[tokio::test]
    async fn test_returns_when_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), detect_shutdown(token))
            .await
            .expect("shutdown detection should end once the token is cancelled");
    }
}
