// ── Failure policy ──
//
// Which run steps abort the whole run and which only log a warning.
// Per-stack extraction is never listed: it is always isolated.

use std::fmt;

use serde::Serialize;

/// A run step whose failure handling is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    PlatformBackup,
    ResolveEndpoints,
    ListStacks,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PlatformBackup => "platform backup",
            Self::ResolveEndpoints => "endpoint resolution",
            Self::ListStacks => "stack enumeration",
        })
    }
}

/// What to do when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    /// Log and continue with an empty result.
    Warn,
    /// Stop the run and report the error.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    pub platform_backup: OnFailure,
    pub endpoints: OnFailure,
    pub stacks: OnFailure,
}

impl Default for FailurePolicy {
    /// Platform export is best-effort; both listings are required.
    fn default() -> Self {
        Self {
            platform_backup: OnFailure::Warn,
            endpoints: OnFailure::Abort,
            stacks: OnFailure::Abort,
        }
    }
}

impl FailurePolicy {
    /// Default policy with the platform export made mandatory.
    pub fn strict() -> Self {
        Self {
            platform_backup: OnFailure::Abort,
            ..Self::default()
        }
    }

    pub fn on_failure(self, step: Step) -> OnFailure {
        match step {
            Step::PlatformBackup => self.platform_backup,
            Step::ResolveEndpoints => self.endpoints,
            Step::ListStacks => self.stacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let policy = FailurePolicy::default();
        assert_eq!(policy.on_failure(Step::PlatformBackup), OnFailure::Warn);
        assert_eq!(policy.on_failure(Step::ResolveEndpoints), OnFailure::Abort);
        assert_eq!(policy.on_failure(Step::ListStacks), OnFailure::Abort);
    }

    #[test]
    fn strict_requires_platform_backup() {
        assert_eq!(
            FailurePolicy::strict().on_failure(Step::PlatformBackup),
            OnFailure::Abort
        );
    }
}
