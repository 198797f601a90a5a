use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetstatError {
    #[error("{}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NetstatError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NetstatError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetstatError>;
