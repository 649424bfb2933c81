//! This module contains the primary error type for the analyzer's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.
//!
//! Each subsystem error carries the source line it occurred on directly;
//! analysis is fatal per program on the first failure, so there is exactly
//! one error per failed program and no container of accumulated errors.
//!
//! # Anyhow
//!
//! All of the errors implement [`std::error::Error`], and hence can be used
//! with [`anyhow::Error`] internally. It is _not_ recommended to use that
//! error type in the interface of the library, as this forces clients to also
//! use `anyhow`.

pub mod cfg;
pub mod parsing;

use std::rc::Rc;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Note that _all_ of the library is public in
/// order to facilitate use-cases beyond the ones designed for.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by
/// the clients of the library) should be members of this enum.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Errors that come from the lexing and parsing process.
    #[error(transparent)]
    Parsing(#[from] parsing::Error),

    /// Errors from the CFG reconstruction subsystem of the library.
    #[error(transparent)]
    Cfg(#[from] cfg::Error),

    /// Unknown errors, usually from the dependencies of the library.
    ///
    /// It is wrapped in an [`Rc`] to ensure that it can be cloned like the
    /// other error types in this interface error.
    #[error(transparent)]
    Other(Rc<anyhow::Error>),
}

impl Error {
    /// The one-based source line the error is pinned to, where it has one.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Error::Parsing(error) => Some(error.line),
            Error::Cfg(error) => Some(error.line),
            Error::Other(_) => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(Rc::new(value))
    }
}
