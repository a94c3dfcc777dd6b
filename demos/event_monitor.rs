//! Event monitor - Follows capture and processing events of one take
//!
//! Run with: cargo run --example event_monitor -- [EVENTS_URL] [TAKE_ID]
//!
//! Examples:
//!   cargo run --example event_monitor                                        # http://localhost:8000/api/events, take 1
//!   cargo run --example event_monitor -- http://10.0.0.5:8000/api/events 42
//!
//! Prints connection state changes, the activity state of the take and the
//! predicted frame count until interrupted with Ctrl-C.

use capture_sync::events::{ClientConfig, EventStreamClient, HttpEventTransport};
use capture_sync::progress::{PredictorConfig, ProgressTracker};
use capture_sync::session::{CaptureSession, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let url = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "http://localhost:8000/api/events".to_string());
    let take_id = args.get(2).cloned().unwrap_or_else(|| "1".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("capture_sync=info".parse()?)
                .add_directive("event_monitor=info".parse()?),
        )
        .init();

    let transport = HttpEventTransport::from_url(&url)?;
    let client = EventStreamClient::with_config(transport, ClientConfig::default());

    let session = CaptureSession::new(
        ProgressTracker::spawn(PredictorConfig::default()),
        SessionConfig::default(),
    );
    session.attach(&client, &take_id);

    let mut state = client.watch_state();
    let mut activity = session.activity();
    let mut progress = session.progress();

    if let Err(e) = client.connect().await {
        println!("Initial connect failed ({}), retrying in the background", e);
    }

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("Connection: {:?}", *state.borrow_and_update());
            }
            changed = activity.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = activity.borrow_and_update().clone();
                println!(
                    "Take {}: capture={:?} processing={:?} frames={} processed={}/{}",
                    current.take_id.as_deref().unwrap_or("-"),
                    current.capture,
                    current.processing,
                    current.frame_count,
                    current.processed,
                    current.processing_total,
                );
            }
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *progress.borrow_and_update();
                if snapshot.active {
                    println!(
                        "Frames: {} (confidence {:.2})",
                        snapshot.displayed, snapshot.confidence
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down");
                break;
            }
        }
    }

    client.disconnect();
    let stats = client.stats();
    println!(
        "Stats: connections={} reconnects={} messages={} duplicates={}",
        stats.connections, stats.reconnect_attempts, stats.messages_received, stats.duplicates_dropped
    );

    Ok(())
}

fn print_usage() {
    println!("Event monitor - follows capture and processing events of one take");
    println!();
    println!("Usage: event_monitor [EVENTS_URL] [TAKE_ID]");
    println!();
    println!("Arguments:");
    println!("  EVENTS_URL  SSE endpoint (default: http://localhost:8000/api/events)");
    println!("  TAKE_ID     Take to follow (default: 1)");
    println!();
    println!("Environment:");
    println!("  RUST_LOG    Log filter, e.g. capture_sync=debug");
}
