use thiserror::Error;

#[derive(Error, Debug)]
pub enum TierTagError {
    #[error("Score source unavailable for {principal}: {reason}")]
    SourceUnavailable { principal: String, reason: String },
    
    #[error("Malformed score payload {raw:?}: {message}")]
    MalformedScore { raw: String, message: String },
    
    #[error("Score query timed out for {principal} after {timeout_ms}ms")]
    QueryTimeout { principal: String, timeout_ms: u64 },
    
    #[error("Tier refresh is already running")]
    AlreadyRunning,
    
    #[error("Scheduler error: {0}")]
    Scheduler(String),
    
    #[error("Placeholder registration failed: {0}")]
    Placeholder(String),
    
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl TierTagError {
    /// Whether the score source itself reported it could not answer.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TierTagError::SourceUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, TierTagError>;
