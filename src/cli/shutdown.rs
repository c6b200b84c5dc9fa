use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects Ctrl+C and turns it into a cancellation, so the prompt loop can finalize the active
/// session instead of the process dying mid-write.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Couldn't listen for Ctrl+C {e:?}");
                return;
            }
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
