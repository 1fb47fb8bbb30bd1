//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;

/// Install a formatted subscriber
///
/// `RUST_LOG` overrides `default_filter`. Returns `false` if a global
/// subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .try_init()
        .is_ok()
}

/// Install a formatted subscriber using the configured `log_filter`
pub fn init_from(config: &EngineConfig) -> bool {
    init(&config.log_filter)
}
