use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnifeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Logging setup failed: {0}")]
    Telemetry(String),

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("Render failed for {package}: {message}")]
    Render { package: String, message: String },

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Worker pool closed")]
    PoolClosed,
}

pub type Result<T> = std::result::Result<T, KnifeError>;
