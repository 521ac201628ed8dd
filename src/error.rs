//! Stable error codes for reports.

use crate::batch::FailureReason;
use crate::command::ParseError;
use crate::patch::PatchError;
use crate::reader::FileReadError;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // File errors (whole batch)
    FileReadError,

    // Record parse errors
    NotATuple,
    TupleTooShort,
    UnknownCommand,
    EntryExpected,

    // Patch errors
    TupleListExpected,
    EmptyPath,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::FileReadError => "FILE_READ_ERROR",
            ErrorCode::NotATuple => "NOT_A_TUPLE",
            ErrorCode::TupleTooShort => "TUPLE_TOO_SHORT",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::EntryExpected => "ENTRY_EXPECTED",
            ErrorCode::TupleListExpected => "TUPLE_LIST_EXPECTED",
            ErrorCode::EmptyPath => "EMPTY_PATH",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::NotATuple => ErrorCode::NotATuple,
            ParseError::TupleTooShort => ErrorCode::TupleTooShort,
            ParseError::UnknownCommand(_) => ErrorCode::UnknownCommand,
            ParseError::EntryExpected(_) => ErrorCode::EntryExpected,
        }
    }
}

impl PatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PatchError::TupleListExpected { .. } => ErrorCode::TupleListExpected,
            PatchError::EmptyPath => ErrorCode::EmptyPath,
        }
    }
}

impl FailureReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            FailureReason::Parse(e) => e.code(),
            FailureReason::Patch(e) => e.code(),
        }
    }
}

impl FileReadError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::FileReadError
    }
}
