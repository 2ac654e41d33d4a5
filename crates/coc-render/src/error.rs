use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template placeholder {{{{{0}}}}} has no value")]
    UnknownPlaceholder(String),

    #[error("template placeholder starting at byte {0} is not closed")]
    UnclosedPlaceholder(usize),

    #[error("failed to serialize chart data: {0}")]
    Json(#[from] serde_json::Error),
}
