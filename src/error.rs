use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scan error in {file}: {message}")]
    Scan { file: String, message: String },

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GuardError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
