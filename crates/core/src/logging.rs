//! Logging infrastructure for docchat.
//!
//! Initializes the tracing subscriber. All logs go to stderr so stdout stays
//! clean for answers and `--json` output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `log_level`; with neither set the
/// filter defaults to `info`. `json` switches to the JSON formatter, which
/// is what the server wants when its output is collected.
///
/// # Example
/// ```no_run
/// use docchat_core::logging::init_logging;
///
/// init_logging(Some("debug"), false, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool, json: bool) -> AppResult<()> {
    let filter_str = resolve_filter(std::env::var("RUST_LOG").ok(), log_level);

    let env_filter = EnvFilter::try_new(&filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(!no_color && supports_color()),
            )
            .try_init()
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

fn resolve_filter(env_filter: Option<String>, log_level: Option<&str>) -> String {
    env_filter
        .filter(|f| !f.trim().is_empty())
        .or_else(|| log_level.map(str::to_string))
        .unwrap_or_else(|| "info".to_string())
}

/// NO_COLOR disables ANSI output regardless of flags.
fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
