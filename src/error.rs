use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemeClawError {
    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Twitter API error: {0}")]
    TwitterApi(String),

    #[error("Google Drive error: {0}")]
    DriveApi(String),

    #[error("Meme generation error: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
