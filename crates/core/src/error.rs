use std::path::PathBuf;

/// Errors raised while loading, validating, or saving the configuration record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration JSON: {0}")]
    InvalidJson(String),

    #[error("Failed to read configuration: {0}")]
    Read(String),

    #[error("Missing API key: set openai_config.api_key before generating")]
    MissingCredential,

    #[error("Missing endpoint: set openai_config.base_url before generating")]
    MissingEndpoint,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to write configuration: {0}")]
    WriteFailed(String),
}

/// Classified failures of a single completion call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FileNamerError {
    #[error("No free file name for '{base}' after {attempts} attempts")]
    ExhaustedAttempts { base: String, attempts: u32 },
}

/// Rejections raised while building a generation request from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invention title must not be empty")]
    EmptyTitle,

    #[error("Technical ideas must not be empty")]
    EmptyIdeas,
}
