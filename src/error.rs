use thiserror::Error;

use crate::users::DeleteCheck;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to generate locked QR without device id.")]
    MissingDeviceId,

    #[error("unsupported link scheme: {0}")]
    UnsupportedScheme(String),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("link payload is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("link json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("locked envelope does not wrap a vmess link")]
    LockedPayload,

    #[error("user file {path}: {message}")]
    UserFile { path: String, message: String },

    #[error("user number {0} not found")]
    UserNotFound(usize),

    #[error("v2ray config {path}: {message}")]
    ServerConfig { path: String, message: String },

    #[error("account id {0} already exists")]
    DuplicateAccount(String),

    #[error("{0}")]
    DeleteRejected(DeleteCheck),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn user_file(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Error::UserFile {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn server_config(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Error::ServerConfig {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
