//! Domain primitives shared by the storage, service and API layers.
//!
//! Error classification lives here so that the HTTP status of a failure is
//! derived from an explicit discriminant rather than from the concrete error
//! type that produced it.

use serde::Serialize;
use std::fmt;

/// Classification of every failure the core can report.
///
/// # Examples
///
/// ```rust
/// use gooji::domain::ErrorKind;
///
/// assert_eq!(ErrorKind::Security.status_code(), 403);
/// assert_eq!(ErrorKind::Validation.as_str(), "validation");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Security,
    NotFound,
    Inspection,
    Storage,
    Internal,
}

/// Status code table indexed by [`ErrorKind`].
const HTTP_STATUS_TABLE: &[(ErrorKind, u16)] = &[
    (ErrorKind::Validation, 400),
    (ErrorKind::Security, 403),
    (ErrorKind::NotFound, 404),
    (ErrorKind::Inspection, 500),
    (ErrorKind::Storage, 500),
    (ErrorKind::Internal, 500),
];

impl ErrorKind {
    #[must_use]
    pub fn status_code(self) -> u16 {
        HTTP_STATUS_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(500, |(_, status)| *status)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Security => "security",
            Self::NotFound => "not_found",
            Self::Inspection => "inspection",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of removing a single on-disk artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Deleted,
    Absent,
    /// The path for the artifact failed validation and was never touched.
    Rejected(String),
    Failed(String),
}

impl ArtifactOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Failed(_))
    }
}

/// Per-artifact outcome of deleting a video.
///
/// The aggregate delete operation always reports success to HTTP callers;
/// this report keeps the detail for logging and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub video: ArtifactOutcome,
    pub metadata: ArtifactOutcome,
    pub thumbnail: ArtifactOutcome,
}

impl DeleteReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !self.video.is_failure() && !self.metadata.is_failure() && !self.thumbnail.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_covers_every_kind() {
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::Security.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Inspection.status_code(), 500);
        assert_eq!(ErrorKind::Storage.status_code(), 500);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn delete_report_completeness() {
        let mut report = DeleteReport {
            video: ArtifactOutcome::Deleted,
            metadata: ArtifactOutcome::Absent,
            thumbnail: ArtifactOutcome::Absent,
        };
        assert!(report.is_complete());

        report.thumbnail = ArtifactOutcome::Failed("permission denied".to_string());
        assert!(!report.is_complete());
    }

    #[test]
    fn artifact_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ArtifactOutcome::Rejected("bad".to_string())).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "bad");

        let json = serde_json::to_value(ArtifactOutcome::Deleted).unwrap();
        assert_eq!(json["status"], "deleted");
    }
}
