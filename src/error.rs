use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotedupError {
    #[error("Please provide a folder path")]
    MissingArgument,

    #[error("Invalid folder path provided: {0:?}")]
    InvalidArgument(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Folder \"{0}\" already exists. Please rename or delete it first.")]
    AlreadyExists(String),

    #[error("Failed to copy note {index} ({name}): {reason}")]
    NoteCopyFailure {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("Folder is not accessible: {0}")]
    InaccessibleFolder(String),

    #[error("Notes error: {0}")]
    Host(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, NotedupError>;
