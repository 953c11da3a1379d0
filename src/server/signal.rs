// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::watch;

use crate::logger;

/// Shutdown broadcast shared by the accept loop and every connection
pub struct SignalHandler {
    shutdown: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown }
    }

    /// Ask the server to stop; idempotent
    pub fn trigger_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver that observes the shutdown flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until shutdown has been requested through `rx`
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    // A closed channel means the handler is gone; treat it as shutdown
    let _ = rx.wait_for(|requested| *requested).await;
}

/// Start signal handlers (Unix)
///
/// Registration happens before returning so a failure surfaces at startup.
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_shutdown_requested(name);
        handler.trigger_shutdown();
    });
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_shutdown_requested("Ctrl+C");
            handler.trigger_shutdown();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let handler = SignalHandler::new();
        let mut rx = handler.subscribe();
        assert!(!handler.is_shutdown_requested());

        let waiter = tokio::spawn(async move { wait_for_shutdown(&mut rx).await });
        handler.trigger_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("subscriber woke up")
            .unwrap();
        assert!(handler.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_shutdown() {
        let handler = SignalHandler::new();
        handler.trigger_shutdown();
        handler.trigger_shutdown();

        let mut rx = handler.subscribe();
        tokio::time::timeout(Duration::from_millis(100), wait_for_shutdown(&mut rx))
            .await
            .expect("already requested");
    }
}
