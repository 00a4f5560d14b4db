// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError,      // will never be produced
    DoesNotExist, // the named entity doesn't exist
    DuplicateIdentifier,
    UnresolvedReference,
    DanglingConnectivity,
    BadConnectivityArity,
    UnresolvedFrame,
    CyclicFrame,
    DegenerateFrame,
    DofConflict,
    EmptyFunctionTable,
    ValidationFailed,
    JsonDeserialization,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            DoesNotExist => "does_not_exist",
            DuplicateIdentifier => "duplicate_identifier",
            UnresolvedReference => "unresolved_reference",
            DanglingConnectivity => "dangling_connectivity",
            BadConnectivityArity => "bad_connectivity_arity",
            UnresolvedFrame => "unresolved_frame",
            CyclicFrame => "cyclic_frame",
            DegenerateFrame => "degenerate_frame",
            DofConflict => "dof_conflict",
            EmptyFunctionTable => "empty_function_table",
            ValidationFailed => "validation_failed",
            JsonDeserialization => "json_deserialization",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Construction-time failure surfaced directly from an insert call.
    Model,
    /// Graph-level failure detected during finalization.
    Validation,
    /// Failure reading or writing the JSON interchange form.
    Interchange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl From<Box<dyn std::error::Error>> for Error {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        Error {
            kind: ErrorKind::Model,
            code: ErrorCode::Generic,
            details: Some(err.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Model => "ModelError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Interchange => "InterchangeError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Validation,
        ErrorCode::CyclicFrame,
        Some("coordinate_system #4".to_owned()),
    );
    assert_eq!(
        "ValidationError{cyclic_frame: coordinate_system #4}",
        format!("{err}")
    );

    let err = Error::new(ErrorKind::Model, ErrorCode::DuplicateIdentifier, None);
    assert_eq!("ModelError{duplicate_identifier}", format!("{err}"));
}

#[test]
fn test_error_code_display_is_snake_case() {
    let codes = [
        (ErrorCode::DanglingConnectivity, "dangling_connectivity"),
        (ErrorCode::DofConflict, "dof_conflict"),
        (ErrorCode::UnresolvedFrame, "unresolved_frame"),
        (ErrorCode::JsonDeserialization, "json_deserialization"),
    ];
    for (code, expected) in codes {
        assert_eq!(expected, format!("{code}"));
    }
}
