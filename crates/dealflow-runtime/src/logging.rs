#![forbid(unsafe_code)]

//! Tracing subscriber setup.
//!
//! Targets emitted by this workspace:
//!
//! | target | events |
//! |---|---|
//! | `dealflow.reducer` | preview (trace) and commit (debug) |
//! | `dealflow.session` | drag start/restart/rebase (debug) |
//! | `dealflow.board` | update spans, filter and cap changes (debug) |
//! | `dealflow.sync` | stage update issued (debug), persisted (info), failed (warn) |
//! | `dealflow.rollback` | fetch requested/stale (debug), replaced (info), failed (error) |
//! | `dealflow.runtime` | simulator task scheduling (trace) |

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "DEALFLOW_LOG";

/// Directives used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Filter from [`LOG_ENV`], falling back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber, writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(format: LogFormat) -> bool {
    let json = format == LogFormat::Json;
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    tracing_subscriber::registry()
        .with(env_filter())
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .is_ok()
}
