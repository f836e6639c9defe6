//! Command result records.
//!
//! Every sub-command produces exactly one [`CmdResult`]: a result code and
//! an optional payload — a JSON array for shows, a descriptive sentence
//! for failures.  The wire form is the JSON object the management session
//! prints: `{"ret":"OK"}`, `{"ret":"OK","data":[…]}`,
//! `{"ret":"NOT_FOUND","data":"name = :p01"}`.

use serde_json::{Value, json};

use crate::error::{DatastoreError, ResultCode};

/// The outcome of one dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub struct CmdResult {
    pub code: ResultCode,
    /// Failure sentence; `None` on success.
    pub message: Option<String>,
    /// Show / stats payload; `None` when the command only mutated.
    pub data: Option<Value>,
}

impl CmdResult {
    pub fn ok() -> Self {
        Self {
            code: ResultCode::Ok,
            message: None,
            data: None,
        }
    }

    pub fn ok_with(data: Value) -> Self {
        Self {
            code: ResultCode::Ok,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }

    /// Render the wire form.
    pub fn to_json(&self) -> Value {
        match (&self.message, &self.data) {
            (Some(msg), _) => json!({"ret": self.code.as_str(), "data": msg}),
            (None, Some(data)) => json!({"ret": self.code.as_str(), "data": data}),
            (None, None) => json!({"ret": self.code.as_str()}),
        }
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

impl From<DatastoreError> for CmdResult {
    fn from(e: DatastoreError) -> Self {
        Self::error(e.code, e.message)
    }
}
