// src/error.rs
//! Error handling for the physics core.
//!
//! - Geometry predicates never fail: misconfiguration is logged and treated as "no collision".
//! - Registry operations (spaces, engine objects, constraints) report `NotFound`,
//!   `AlreadyExists` or `InvalidArgument` instead of leaking or dereferencing absent entries.
//! - `Result<T>` alias for the whole crate.

use thiserror::Error;

/// Main error type, `Send + Sync + 'static`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O errors (config loading).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of configuration records.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A keyed entry (collider, object, constraint, layer) does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A keyed entry is already registered and the operation is define-once.
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },

    /// The caller passed something the operation cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Simple custom message.
    #[error("{0}")]
    Custom(String),

    /// Context chaining.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn msg(msg: &'static str) -> Self {
        Self::Custom(msg.into())
    }

    #[inline]
    pub fn not_found<S: Into<String>>(kind: &'static str, id: S) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    #[inline]
    pub fn already_exists<S: Into<String>>(kind: &'static str, id: S) -> Self {
        Self::AlreadyExists { kind, id: id.into() }
    }

    #[inline]
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Add context to any error (chainable, like `.context()` in anyhow).
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context layers.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }

    #[inline]
    pub fn is_already_exists(&self) -> bool {
        matches!(self.root(), Error::AlreadyExists { .. })
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.root(), Error::InvalidArgument(_))
    }

    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self.root(), Error::Io(_))
    }
}

/// Convenient `Result` alias, use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;
