//! Unified error type for the configuration datastore.
//!
//! Every fallible operation funnels into [`DatastoreError`]: a result code
//! (the stable, user-visible identifier rendered into command results) plus
//! a one-sentence message.  Keeping code and message together lets the
//! dispatcher serialise any failure as `{"ret":"<CODE>","data":"<message>"}`
//! without re-interpreting it at every call site.

use std::fmt;

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

/// Stable result codes shared by every sub-command.
///
/// `InterpError` is special: it marks a propagation failure whose message
/// already names the failing referenced object.  Callers must not overwrite
/// the message of an `InterpError`, only pass it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    InvalidArgs,
    NotFound,
    AlreadyExists,
    NotOperational,
    InvalidObject,
    OutOfRange,
    TooLong,
    TooShort,
    NoMemory,
    NotStarted,
    InterpError,
}

impl ResultCode {
    /// Wire spelling used in the `"ret"` field of a result record.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotOperational => "NOT_OPERATIONAL",
            Self::InvalidObject => "INVALID_OBJECT",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::TooLong => "TOO_LONG",
            Self::TooShort => "TOO_SHORT",
            Self::NoMemory => "NO_MEMORY",
            Self::NotStarted => "NOT_STARTED",
            Self::InterpError => "INTERP_ERROR",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DatastoreError
// ---------------------------------------------------------------------------

/// A failed datastore operation: result code plus descriptive sentence.
///
/// A *finalized* error carries a message that must survive to the user
/// untouched — typically a propagation failure naming the referenced
/// object that failed.  Outer layers that would normally re-word an error
/// with their own context leave finalized errors alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct DatastoreError {
    pub code: ResultCode,
    pub message: String,
    finalized: bool,
}

impl DatastoreError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            finalized: false,
        }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ResultCode::InvalidArgs, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ResultCode::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ResultCode::AlreadyExists, message)
    }

    pub fn not_operational(message: impl Into<String>) -> Self {
        Self::new(ResultCode::NotOperational, message)
    }

    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::new(ResultCode::InvalidObject, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ResultCode::OutOfRange, message)
    }

    pub fn too_long(message: impl Into<String>) -> Self {
        Self::new(ResultCode::TooLong, message)
    }

    pub fn too_short(message: impl Into<String>) -> Self {
        Self::new(ResultCode::TooShort, message)
    }

    pub fn not_started(message: impl Into<String>) -> Self {
        Self::new(ResultCode::NotStarted, message)
    }

    /// Seal the message: no outer layer may re-word this error.
    pub fn finalize(mut self) -> Self {
        self.finalized = true;
        self
    }

    /// True when the message must be passed through untouched.
    pub fn is_final(&self) -> bool {
        self.finalized
    }

    /// Re-word an error with the caller's context, unless the message was
    /// finalized deeper down.
    pub fn with_context(self, message: impl Into<String>) -> Self {
        if self.finalized {
            self
        } else {
            Self::new(self.code, message)
        }
    }
}

/// Datastore-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DatastoreError>;
