/// Initializes structured logging for the tracker.
///
/// Verbosity is controlled with `RUST_LOG`, defaulting to `info`:
/// - `RUST_LOG=debug` - also shows ignored events and dropped payloads
/// - `RUST_LOG=ride_tracker=trace` - everything from this crate
///
/// Calling it twice is harmless; the second call leaves the first subscriber in place.
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
