//! This module contains the error type that pertains to control-flow graph
//! reconstruction and subroutine recovery.
//!
//! CFG failures always originate at a concrete instruction, so the error is
//! pinned to that instruction's source line.

use thiserror::Error;

/// A CFG reconstruction failure, pinned to the source line of the
/// instruction that caused it.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("line {line}: {kind}")]
pub struct Error {
    /// The one-based source line of the offending instruction.
    pub line: u32,

    /// What went wrong at that instruction.
    pub kind: ErrorKind,
}

/// The ways the instruction stream can fail to form a graph.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ErrorKind {
    #[error("Branch to label `{_0}` that resolves to no basic block")]
    UnresolvedBranchTarget(String),

    #[error("`retsub` is not contained in any subroutine")]
    RetsubOutsideSubroutine,

    #[error("`callsub` targets label `{_0}` which is not a subroutine entry")]
    CallsubToNonSubroutine(String),
}

impl ErrorKind {
    /// Pins the failure to the one-based source `line`.
    #[must_use]
    pub fn at(self, line: u32) -> Error {
        Error { line, kind: self }
    }
}

/// The result type for functions that may return CFG errors.
pub type Result<T> = std::result::Result<T, Error>;
