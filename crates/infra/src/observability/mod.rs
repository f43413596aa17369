//! Logging initialization
//!
//! Log level comes from `RUST_LOG` and defaults to `info`. Request logs are
//! emitted at `debug`, state transitions at `trace`:
//!
//! ```text
//! RUST_LOG=mixtape_infra=debug      # requests, responses, retries
//! RUST_LOG=mixtape_infra::http=trace # plus call state transitions
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (for example by
/// the host application or an earlier call); the existing one is kept.
pub fn init_tracing(format: TracingFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        TracingFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        TracingFormat::Json => {
            registry.with(fmt::layer().json().with_target(true).with_current_span(true)).try_init()
        }
    };
    installed.is_ok()
}
