// ── Domain model ──
//
// Read-only snapshots of platform state, converted from wire types once
// per run, plus the record of what a run wrote to disk.

mod artifact;
mod endpoint;
mod stack;

pub use artifact::{AbsenceReason, ContentOutcome, StackArtifact};
pub use endpoint::{Endpoint, EndpointDirectory};
pub use stack::{GitSource, Stack, StackMetadata, StackType};
