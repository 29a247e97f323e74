use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for minidb operations
///
/// Each kind describes one category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust
/// use minidb::errors::{ErrorKind, MiniDbError, MiniDbResult};
///
/// fn example() -> MiniDbResult<()> {
///     Err(MiniDbError::new("unexpected token", ErrorKind::ParseError))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::ParseError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Filter Errors
    /// Filter expression text is not valid per the filter grammar
    ParseError,

    // Record Errors
    /// A value that cannot be represented in the record model
    InvalidRecord,

    // IO and Storage Errors
    /// Generic IO error
    IOError,
    /// The disk is full
    DiskFull,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// Persisted content is not a valid document
    FileCorrupted,
    /// Error encoding or decoding persisted data
    EncodingError,

    // Operation Errors
    /// The operation is not valid in the current state
    InvalidOperation,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` for the kinds raised while loading or saving the
    /// persisted document.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::IOError
                | ErrorKind::DiskFull
                | ErrorKind::FileNotFound
                | ErrorKind::PermissionDenied
                | ErrorKind::FileCorrupted
                | ErrorKind::EncodingError
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ParseError => write!(f, "Parse error"),
            ErrorKind::InvalidRecord => write!(f, "Invalid record"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::DiskFull => write!(f, "Disk full"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileCorrupted => write!(f, "File corrupted"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom minidb error type.
///
/// `MiniDbError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust
/// use minidb::errors::{ErrorKind, MiniDbError};
///
/// let cause = MiniDbError::new("disk quota exceeded", ErrorKind::DiskFull);
/// let err = MiniDbError::new_with_cause("Failed to save", ErrorKind::IOError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct MiniDbError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MiniDbError>>,
    backtrace: Arc<Backtrace>,
}

impl MiniDbError {
    /// Creates a new `MiniDbError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MiniDbError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `MiniDbError` that wraps a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MiniDbError) -> Self {
        MiniDbError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MiniDbError> {
        self.cause.as_deref()
    }
}

impl Display for MiniDbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MiniDbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for MiniDbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for minidb operations.
pub type MiniDbResult<T> = Result<T, MiniDbError>;

impl de::Error for MiniDbError {
    fn custom<T: Display>(msg: T) -> Self {
        MiniDbError::new(&msg.to_string(), ErrorKind::InvalidRecord)
    }
}

impl ser::Error for MiniDbError {
    fn custom<T: Display>(msg: T) -> Self {
        MiniDbError::new(&msg.to_string(), ErrorKind::InvalidRecord)
    }
}

impl From<std::io::Error> for MiniDbError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::StorageFull => ErrorKind::DiskFull,
            _ => ErrorKind::IOError,
        };
        MiniDbError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for MiniDbError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let error_kind = match err.classify() {
            Category::Io => ErrorKind::IOError,
            Category::Syntax | Category::Eof => ErrorKind::FileCorrupted,
            Category::Data => ErrorKind::EncodingError,
        };
        MiniDbError::new(&format!("JSON error: {}", err), error_kind)
    }
}

impl From<std::string::FromUtf8Error> for MiniDbError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        MiniDbError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for MiniDbError {
    fn from(msg: String) -> Self {
        MiniDbError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MiniDbError {
    fn from(msg: &str) -> Self {
        MiniDbError::new(msg, ErrorKind::InternalError)
    }
}
