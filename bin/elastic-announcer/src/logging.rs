use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Map a configured level to a filter directive, `None` if unknown
fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        _ => None,
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init(level: &str, json: bool) {
    let directive = level_directive(level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive.unwrap_or(DEFAULT_LEVEL)));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if directive.is_none() {
        warn!(configured = level, "unknown log level, using {}", DEFAULT_LEVEL);
    }
}
