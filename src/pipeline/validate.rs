//! File validation: accept or reject by declared MIME type and size.
//!
//! Pure and synchronous. The type check runs first, so a file that is both
//! the wrong type and too large is reported as unsupported.

use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::error::RejectionReason;
use crate::input::{FileKind, InputFile};
use serde::{Deserialize, Serialize};

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub kind: Option<FileKind>,
    pub reason: Option<RejectionReason>,
}

impl ValidationResult {
    fn accepted(kind: FileKind) -> Self {
        Self {
            valid: true,
            kind: Some(kind),
            reason: None,
        }
    }

    fn rejected(reason: RejectionReason) -> Self {
        Self {
            valid: false,
            kind: None,
            reason: Some(reason),
        }
    }
}

impl From<Result<FileKind, RejectionReason>> for ValidationResult {
    fn from(outcome: Result<FileKind, RejectionReason>) -> Self {
        match outcome {
            Ok(kind) => Self::accepted(kind),
            Err(reason) => Self::rejected(reason),
        }
    }
}

/// Validate a file against the default 10 MiB limit.
pub fn validate_file(file: &InputFile) -> ValidationResult {
    validate_with_limit(file.mime_type(), file.size(), DEFAULT_MAX_FILE_SIZE)
}

/// Validate a declared MIME type and size against `max_size`.
pub fn validate_with_limit(mime_type: &str, size: u64, max_size: u64) -> ValidationResult {
    classify(mime_type, size, max_size).into()
}

/// The same checks as [`validate_with_limit`], shaped for `?`.
pub fn classify(mime_type: &str, size: u64, max_size: u64) -> Result<FileKind, RejectionReason> {
    let kind = FileKind::from_mime(mime_type).ok_or_else(|| RejectionReason::UnsupportedType {
        mime: mime_type.to_string(),
    })?;
    if size > max_size {
        return Err(RejectionReason::TooLarge {
            size,
            max: max_size,
        });
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u64 = DEFAULT_MAX_FILE_SIZE;

    #[test]
    fn accepts_pdf_and_images() {
        let r = validate_with_limit("application/pdf", 1024, MAX);
        assert!(r.valid);
        assert_eq!(r.kind, Some(FileKind::Pdf));
        assert_eq!(r.reason, None);

        let r = validate_with_limit("image/webp", 1024, MAX);
        assert_eq!(r.kind, Some(FileKind::Image));
    }

    #[test]
    fn oversize_image_is_rejected_for_size() {
        let r = validate_with_limit("image/png", 11_000_000, MAX);
        assert!(!r.valid);
        assert_eq!(r.kind, None);
        assert!(matches!(r.reason, Some(RejectionReason::TooLarge { size: 11_000_000, .. })));
    }

    #[test]
    fn unsupported_type_is_rejected_regardless_of_size() {
        let r = validate_with_limit("text/plain", 100, MAX);
        assert!(matches!(r.reason, Some(RejectionReason::UnsupportedType { .. })));
    }

    #[test]
    fn type_check_takes_precedence_over_size() {
        let r = validate_with_limit("text/plain", 50_000_000, MAX);
        assert!(matches!(r.reason, Some(RejectionReason::UnsupportedType { .. })));
    }

    #[test]
    fn limit_is_inclusive() {
        assert!(validate_with_limit("application/pdf", MAX, MAX).valid);
        assert!(!validate_with_limit("application/pdf", MAX + 1, MAX).valid);
    }

    #[test]
    fn validation_is_deterministic() {
        let f = InputFile::new("a.png", "image/png", vec![0u8; 10]);
        assert_eq!(validate_file(&f), validate_file(&f));
    }

    #[test]
    fn classify_maps_both_outcomes() {
        assert_eq!(classify("image/png", 1, MAX), Ok(FileKind::Image));
        assert!(classify("image/gif", 1, MAX).is_err());
    }
}
