pub mod builders;
pub mod scratch;

use std::sync::Once;
use std::time::Duration;

use recoverd::broadcast::{LogEvent, LogSubscription};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
///
/// Real child processes are involved in most tests, so this is a bit more
/// generous than a pure in-memory test would need.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Drain `sub` up to and including the first completion event.
///
/// Panics if the channel closes first.
pub async fn collect_until_complete(sub: &mut LogSubscription) -> Vec<LogEvent> {
    let mut events = Vec::new();
    loop {
        let event = sub
            .recv()
            .await
            .expect("broadcast closed before the run completed");
        let done = event.is_complete();
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Text of every `Line` event, in order.
pub fn line_texts(events: &[LogEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            LogEvent::Line { text, .. } => Some(text.clone()),
            LogEvent::Complete { .. } => None,
        })
        .collect()
}

/// Success flag of the trailing completion event, if there is one.
pub fn completion(events: &[LogEvent]) -> Option<bool> {
    match events.last() {
        Some(LogEvent::Complete { success, .. }) => Some(*success),
        _ => None,
    }
}
