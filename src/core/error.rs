use std::path::PathBuf;

use thiserror::Error;

/// Fatal setup failures. Anything raised before the bridge is serving
/// propagates out of the boot sequence and aborts the process.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
