pub mod service;

pub use service::MetricsService;

/// Installs the global JSON tracing subscriber.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    Ok(())
}
