use patentdraft_core::error::{ConfigError, RequestError};

/// Reasons a generation cannot be started.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A generation is already running")]
    Busy,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),
}
