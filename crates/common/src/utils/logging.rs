use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,storefront::fetcher=debug";

/// Output format of the tracing subscriber, chosen by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event; the default.
    Json,
    /// Compact human-readable lines for local runs.
    Pretty,
}

impl LogFormat {
    /// `pretty`/`compact`/`text` select [`LogFormat::Pretty`]; anything else is JSON.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("pretty" | "compact" | "text") => Self::Pretty,
            _ => Self::Json,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the stdout subscriber in the requested format. Later calls are no-ops.
pub fn init_logging(format: LogFormat) {
    let builder = fmt().with_env_filter(env_filter()).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Json => builder.with_target(true).json().try_init(),
        LogFormat::Pretty => builder.with_target(false).compact().try_init(),
    };
}
