use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown metric \"{0}\"")]
    UnknownMetric(String),

    #[error("could not resolve local midnight for {date} in {timezone}")]
    AmbiguousMidnight { date: String, timezone: String },

    #[error("history JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
