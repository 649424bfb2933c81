//! This module contains the error type that pertains to the lexing and
//! parsing of program source text.
//!
//! Parsing is line-oriented, so every failure is pinned to the one-based
//! source line it occurred on; there is no such thing as a parse error
//! without a line.

use thiserror::Error;

/// A parsing failure, pinned to the source line it occurred on.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("line {line}: {kind}")]
pub struct Error {
    /// The one-based source line at which parsing failed.
    pub line: u32,

    /// What went wrong on that line.
    pub kind: ErrorKind,
}

/// The ways a source line can fail to parse.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ErrorKind {
    #[error("Unknown mnemonic `{_0}`")]
    UnknownMnemonic(String),

    #[error("`{mnemonic}` expects {expected} immediate argument(s) but {actual} were provided")]
    ImmediateArityMismatch {
        mnemonic: String,
        expected: usize,
        actual:   usize,
    },

    #[error("Invalid integer literal `{_0}`")]
    InvalidIntegerLiteral(String),

    #[error("Invalid byte literal `{_0}`")]
    InvalidByteLiteral(String),

    #[error("Missing closing quote in string literal")]
    UnterminatedString,

    #[error("Unknown `{kind}` field `{name}`")]
    UnknownField { kind: &'static str, name: String },

    #[error("`{mnemonic}` was introduced in version {introduced} but the program declares version {program}")]
    OpcodeFromLaterVersion {
        mnemonic:   String,
        introduced: u8,
        program:    u8,
    },

    #[error("Duplicate definition of label `{_0}`")]
    DuplicateLabel(String),

    #[error("Reference to undefined label `{_0}`")]
    UndefinedLabel(String),

    #[error("Incorrectly formatted label definition `{_0}`")]
    MalformedLabel(String),

    #[error("`#pragma version` is only valid on the first non-blank line")]
    MisplacedPragma,

    #[error("Unsupported `#pragma` directive `{_0}`")]
    UnknownPragma(String),

    #[error("Program contains no instructions")]
    EmptyProgram,
}

impl ErrorKind {
    /// Pins the failure to the one-based source `line`.
    #[must_use]
    pub fn at(self, line: u32) -> Error {
        Error { line, kind: self }
    }
}

/// The result type for functions that may return parsing errors.
pub type Result<T> = std::result::Result<T, Error>;
