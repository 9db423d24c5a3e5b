use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, DEFAULT_LOG_FILTER};

pub const LOG_ENV: &str = "JRNL_LOG";

/// Installs the stderr subscriber. Stdout stays reserved for command output.
pub fn init(config: &LogConfig) {
    let env = std::env::var(LOG_ENV).ok();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(env.as_deref(), &config.filter))
        .with_ansi(use_ansi(
            config.ansi,
            std::env::var_os("NO_COLOR").is_some(),
            io::stderr().is_terminal(),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Escape codes only reach an interactive stderr, and `NO_COLOR` always wins.
fn use_ansi(configured: bool, no_color: bool, stderr_is_terminal: bool) -> bool {
    configured && !no_color && stderr_is_terminal
}

/// The environment wins over the configured directive; an unparseable value
/// at either level falls through to the next.
pub fn build_filter(env: Option<&str>, configured: &str) -> EnvFilter {
    [env, Some(configured)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
