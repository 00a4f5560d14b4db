// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Exit-status vocabulary shared by the converter front end and any runner
//! that drives an external solver.
//!
//! The engine itself never launches processes; it only defines how a caller
//! classifies a finished run. The numeric values are part of the command-line
//! contract and must not change between releases.

use std::fmt;

use crate::common::{Error, ErrorKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Ok,
    GenericFailure,
    NoInputFile,
    OutputDirUnavailable,
    InvalidInvocation,
    ModelValidationError,
    ReadFormatError,
    WriteFormatError,
    ChildCrashed,
    SpawnFailed,
    SolverNotFound,
    SolverSyntaxError,
    SolverKilled,
    SolverExitNotZero,
    SolverResultMissing,
    AssertionMismatch,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        use ExitStatus::*;
        match self {
            Ok => 0,
            GenericFailure => 1,
            NoInputFile => 2,
            OutputDirUnavailable => 3,
            InvalidInvocation => 4,
            ModelValidationError => 5,
            ReadFormatError => 6,
            WriteFormatError => 7,
            ChildCrashed => 8,
            SpawnFailed => 9,
            SolverNotFound => 100,
            SolverSyntaxError => 101,
            SolverKilled => 102,
            SolverExitNotZero => 103,
            SolverResultMissing => 104,
            AssertionMismatch => 105,
        }
    }

    /// Classify an engine error for process-exit purposes.
    pub fn from_error(err: &Error) -> Self {
        match err.kind {
            ErrorKind::Model | ErrorKind::Validation => ExitStatus::ModelValidationError,
            ErrorKind::Interchange => ExitStatus::ReadFormatError,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Ok
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExitStatus::*;
        let name = match self {
            Ok => "ok",
            GenericFailure => "generic_failure",
            NoInputFile => "no_input_file",
            OutputDirUnavailable => "output_dir_unavailable",
            InvalidInvocation => "invalid_invocation",
            ModelValidationError => "model_validation_error",
            ReadFormatError => "read_format_error",
            WriteFormatError => "write_format_error",
            ChildCrashed => "child_crashed",
            SpawnFailed => "spawn_failed",
            SolverNotFound => "solver_not_found",
            SolverSyntaxError => "solver_syntax_error",
            SolverKilled => "solver_killed",
            SolverExitNotZero => "solver_exit_not_zero",
            SolverResultMissing => "solver_result_missing",
            AssertionMismatch => "assertion_mismatch",
        };

        write!(f, "{name}")
    }
}
