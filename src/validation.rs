//! Archive validation
//!
//! A submission is accepted when its locator ends in `.zip` and its bytes open
//! as a ZIP container holding at least one entry. Entry contents are never read.

use crate::error::FormatError;
use std::io::Cursor;
use tracing::debug;

/// Required locator suffix (case-sensitive)
pub const ZIP_SUFFIX: &str = ".zip";

/// Why an archive was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Locator does not end in `.zip`
    WrongExtension,
    /// Bytes are not a ZIP container
    Malformed(String),
    /// Container parsed but holds no entries
    Empty,
}

/// Outcome of validating a fetched artifact
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Archive is well formed and non-empty
    Valid {
        /// Number of entries in the archive
        entries: usize,
    },
    /// Archive was rejected
    Invalid(InvalidReason),
}

impl ValidationResult {
    /// Whether the archive passed validation
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid { .. })
    }

    /// Convert into a `Result`, mapping every rejection to [`FormatError`]
    pub fn into_result(self) -> Result<usize, FormatError> {
        match self {
            ValidationResult::Valid { entries } => Ok(entries),
            ValidationResult::Invalid(reason) => Err(FormatError { reason }),
        }
    }
}

/// Validate a fetched artifact against its claimed locator
pub fn validate(url: &str, bytes: &[u8]) -> ValidationResult {
    // Suffix is checked before the payload is parsed.
    if !url.ends_with(ZIP_SUFFIX) {
        debug!(url, "locator does not end in .zip");
        return ValidationResult::Invalid(InvalidReason::WrongExtension);
    }

    let archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            debug!(url, error = %e, "payload is not a ZIP container");
            return ValidationResult::Invalid(InvalidReason::Malformed(e.to_string()));
        }
    };

    let entries = archive.len();
    if entries == 0 {
        debug!(url, "ZIP archive has no entries");
        return ValidationResult::Invalid(InvalidReason::Empty);
    }

    debug!(url, entries, "ZIP archive accepted");
    ValidationResult::Valid { entries }
}
