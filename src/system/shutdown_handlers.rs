use crate::rpc::ShutdownHandle;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Triggers `shutdown` on Ctrl+C or SIGTERM. The task ends on its own once
/// the handle is shut down by anyone else.
pub(crate) fn setup_signal_shutdown_handler(
    shutdown: &ShutdownHandle,
) -> tokio::task::JoinHandle<()> {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = shutdown.stopped() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, stopping worker");
                    shutdown.shutdown();
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    tracing::info!("SIGTERM received, stopping worker");
                    shutdown.shutdown();
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = shutdown.stopped() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, stopping worker");
                    shutdown.shutdown();
                }
            }
        }
    })
}
