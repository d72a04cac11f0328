//! Error adapter for converting ModellerError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error type
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use modeller::{ModellerError, codec::CodecError};

/// Adapter that renders a [`ModellerError`] as a miette diagnostic.
pub struct ErrorAdapter<'a>(pub &'a ModellerError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            ModellerError::NotFound { .. } => "modeller::not_found",
            ModellerError::Validation(_) => "modeller::validation",
            ModellerError::Codec(_) => "modeller::codec",
            ModellerError::IdentifierCollision { .. } => "modeller::identifier_collision",
            ModellerError::Store(_) => "modeller::store",
            ModellerError::Config(_) => "modeller::config",
            ModellerError::Io(_) => "modeller::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            ModellerError::IdentifierCollision { .. } => {
                "rename one of the elements, or set `markup.strict_identifiers = false`"
            }
            ModellerError::Codec(CodecError::InvalidToken(_)) => {
                "tokens use only the characters 0-9, A-Z, a-z, '-' and '_'"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Convert a [`ModellerError`] into a reportable diagnostic.
pub fn to_reportable(err: &ModellerError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}
