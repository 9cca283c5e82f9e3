use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage credentials are not configured: {0}")]
    MissingCredentials(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("presigning {key} failed: {message}")]
    Presign { key: String, message: String },
}
