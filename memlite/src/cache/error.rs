use std::fmt;

/// Failure of a store or protocol operation.
///
/// `ClientError` means the request itself was malformed, `ServerError`
/// means the server could not carry out an otherwise valid request.
/// Both are reported on the wire and leave the connection open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    ClientError(String),
    ServerError(String),
}

impl CacheError {
    pub const BAD_COMMAND_LINE: &'static str = "bad command line format";
    pub const BAD_DATA_CHUNK: &'static str = "bad data chunk";
    pub const INVALID_INTEGER: &'static str = "Invalid integer value";
    pub const OBJECT_TOO_LARGE: &'static str = "object too large for cache";

    pub fn bad_command_line() -> CacheError {
        CacheError::ClientError(String::from(Self::BAD_COMMAND_LINE))
    }

    pub fn invalid_integer() -> CacheError {
        CacheError::ClientError(String::from(Self::INVALID_INTEGER))
    }

    pub fn unknown_command(command: &str) -> CacheError {
        CacheError::ServerError(format!("unknown command: {}", command))
    }

    pub fn message(&self) -> &str {
        match self {
            CacheError::ClientError(message) | CacheError::ServerError(message) => message,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::ClientError(message) => write!(f, "CLIENT_ERROR {}", message),
            CacheError::ServerError(message) => write!(f, "SERVER_ERROR {}", message),
        }
    }
}

impl std::error::Error for CacheError {}

pub type Result<T> = std::result::Result<T, CacheError>;
