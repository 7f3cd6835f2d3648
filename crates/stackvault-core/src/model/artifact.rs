// ── Per-stack output record ──

use std::path::PathBuf;

use serde::Serialize;

/// Why a stack has no compose file in the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbsenceReason {
    /// The platform answered with an empty body.
    EmptyResponse,
    /// JSON envelope without `StackFileContent` (git/kubernetes stacks).
    NoInlineContent,
    /// Looked like JSON but could not be decoded.
    UnrecognizedResponse,
    /// The request itself failed after retries.
    FetchFailed,
}

impl std::fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::EmptyResponse => "empty response",
            Self::NoInlineContent => "no inline content",
            Self::UnrecognizedResponse => "unrecognized response",
            Self::FetchFailed => "fetch failed",
        })
    }
}

/// What happened to the compose content of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ContentOutcome {
    Written { bytes: usize },
    Absent { reason: AbsenceReason },
}

/// Files written for one stack.
#[derive(Debug, Clone, Serialize)]
pub struct StackArtifact {
    pub stack_id: i64,
    pub stack_name: String,
    pub endpoint: String,
    pub content: ContentOutcome,
    pub content_file: Option<PathBuf>,
    pub metadata_file: PathBuf,
    pub provenance_file: Option<PathBuf>,
}

impl StackArtifact {
    pub fn has_content(&self) -> bool {
        matches!(self.content, ContentOutcome::Written { .. })
    }
}
