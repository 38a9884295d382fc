use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkwrightError {
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Semantic chunking service error: {0}")]
    SemanticService(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChunkwrightError>;
