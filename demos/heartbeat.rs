use realtime_notify::{ClientOptions, NotificationClient};
use std::time::Duration;

/// Watch heartbeats and reconnects with aggressive timings.
///
/// Interrupt the network while this runs to see the backoff, or hide the
/// server behind a proxy that swallows frames to see the health check fire.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    // Initialize tracing to see heartbeat logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let endpoint =
        std::env::var("NOTIFY_ENDPOINT").unwrap_or_else(|_| "ws://localhost:8080/ws".to_string());

    let client = NotificationClient::new(
        &endpoint,
        ClientOptions {
            ping_frequency_ms: 5_000,
            health_check_timeout_ms: 2_000,
            max_delay_ms: 10_000,
            ..Default::default()
        },
    )?;

    println!("🦀 Watching {} for 60 seconds\n", endpoint);

    let mut status = client.watch_status();
    client.start().await;

    let deadline = tokio::time::sleep(Duration::from_secs(60));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                println!(
                    "state={} attempts={} timers={} awaiting_network={}",
                    current.state, current.attempt_count, current.pending_timers, current.awaiting_network
                );
            }
            _ = &mut deadline => break,
        }
    }

    client.stop().await;
    println!("\n✅ Stopped, {} listeners attached", client.signals().listener_count());

    Ok(())
}
