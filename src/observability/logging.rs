//! # Logging
//!
//! Installs the global tracing subscriber. `RUST_LOG` wins when set; otherwise
//! the configured level applies to this crate.

use crate::config::OperatorConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub fn init_logging(config: &OperatorConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.log_format.eq_ignore_ascii_case("json") {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

fn default_directive(level: &str) -> String {
    format!("wavefront_operator={level}")
}
