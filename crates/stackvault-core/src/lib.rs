//! Backup logic between `stackvault-api` and the CLI.
//!
//! - **[`BackupService`]**: orchestrates one run: platform export
//!   (best-effort), endpoint resolution, stack enumeration, per-stack
//!   extraction, and optional retention cleanup. Whether a failing step
//!   aborts the run or only warns is decided by [`FailurePolicy`].
//!
//! - **Extraction** ([`extract`]): decodes the stack-file response into a
//!   [`ComposeSource`] and writes the compose file, metadata document and,
//!   for git-backed stacks without inline content, a provenance note.
//!
//! - **Retention** ([`retention`]): removes run directories older than the
//!   configured age, one level deep only.
//!
//! - **Domain model** ([`model`]): `Stack`, `StackType`, `GitSource`,
//!   `EndpointDirectory`, `StackArtifact`.

pub mod backup;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod model;
pub mod policy;
pub mod retention;
pub mod stacks;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backup::{BackupRun, BackupService, PlatformBackupOutcome, RunReport, StackOutcome};
pub use config::{BackupConfig, TlsVerification};
pub use error::CoreError;
pub use extract::{ComposeSource, endpoint_folder, sanitize_name};
pub use policy::{FailurePolicy, OnFailure, Step};
pub use retention::RetentionPolicy;
pub use stackvault_api::{Error as ApiError, RetryPolicy};

pub use model::{
    AbsenceReason, ContentOutcome, Endpoint, EndpointDirectory, GitSource, Stack, StackArtifact,
    StackMetadata, StackType,
};
