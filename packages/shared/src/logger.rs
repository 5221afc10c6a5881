//! Tracing setup shared by the clubroom binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `fmt` subscriber for the process.
///
/// Unless `RUST_LOG` is set, logs at `default_log_level` from three targets:
/// the `clubroom_server` library, the binary itself (`binary_name` with dashes
/// turned into underscores), and `tower_http`, whose `TraceLayer` emits one
/// span per HTTP request. Everything else stays quiet.
///
/// ```no_run
/// clubroom_shared::logger::setup_logger("clubroom-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Filter directives used when `RUST_LOG` is absent.
fn default_filter(binary_name: &str, level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets = vec!["clubroom_server", binary_target.as_str(), "tower_http"];
    targets.dedup();
    targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}
