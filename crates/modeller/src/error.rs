//! Error types for modeller operations.
//!
//! [`ModellerError`] is returned by every fallible engine operation.
//! Missing children during compilation are not errors: they are skipped and
//! reported in a [`CompileReport`](crate::compiler::CompileReport).

use std::io;

use thiserror::Error;

use modeller_core::{catalogue::ElementId, identifier::Identifier};

use crate::{codec::CodecError, store::StoreError};

/// The main error type for modeller operations.
#[derive(Debug, Error)]
pub enum ModellerError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Identifier `{identifier}` is shared by elements {element_ids:?}")]
    IdentifierCollision {
        identifier: Identifier,
        element_ids: Vec<ElementId>,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ModellerError {
    /// Create a new `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: u64) -> Self {
        Self::NotFound { kind, id }
    }
}
