#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

use dealflow_core::ConfigError;
use dealflow_runtime::GatewayError;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for dealflow tools.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("invalid replay script: {message}")]
    Script { message: String },
}

impl Error {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::Json { .. } | Self::Config(_) => 2,
            Self::Script { .. } => 3,
            Self::Gateway(_) | Self::Output(_) => 1,
        }
    }

    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }
}
