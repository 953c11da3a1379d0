// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::{wait_for_shutdown, SignalHandler};
use crate::config;
use crate::logger;

/// How long open connections get to finish after shutdown is requested
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Interval between checks of the active connection count while draining
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Main accept loop
///
/// Returns once shutdown was requested and open connections have drained
/// or [`SHUTDOWN_GRACE`] has elapsed.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let mut shutdown = signals.subscribe();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            signals.subscribe(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = wait_for_shutdown(&mut shutdown) => break,
        }
    }

    // Stop accepting before draining
    drop(listener);

    let remaining = drain_connections(&active_connections, SHUTDOWN_GRACE).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

/// Wait for the counter to reach zero, at most `grace`
///
/// Returns the number of connections still open afterwards.
async fn drain_connections(active: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let open = active.load(Ordering::SeqCst);
        if open == 0 || tokio::time::Instant::now() >= deadline {
            return open;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
