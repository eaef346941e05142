use realtime_notify::{AudioCue, ClientOptions, NotificationClient};

/// Streams operator notifications from a running console backend
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let origin =
        std::env::var("NOTIFY_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let options = ClientOptions::from_env()?;

    let client = NotificationClient::for_origin(&origin, options)?;
    println!("📡 Listening on {}\n", client.endpoint());

    let mut notifications = client.subscribe();
    client.start().await;

    loop {
        tokio::select! {
            received = notifications.recv() => match received {
                Ok(dispatched) => {
                    let cue = match dispatched.cue {
                        AudioCue::Success => "🔔",
                        AudioCue::Warning => "⚠️ ",
                        AudioCue::Error => "🚨",
                    };
                    println!(
                        "{} [{}] {} - {}",
                        cue, dispatched.event.kind, dispatched.event.title, dispatched.event.message
                    );
                    println!("   unread: {}", client.unread_count().await);
                }
                Err(e) => {
                    println!("⚠️  Notification stream lagged: {}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("\nStopping...");
    client.stop().await;
    println!("Stopped.");

    Ok(())
}
