// ── Stack domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use stackvault_api::{GitConfigResponse, StackResponse, Timestamp};

/// Reference used when a git-backed stack does not name one.
pub const DEFAULT_GIT_REFERENCE: &str = "refs/heads/main";

/// Compose path used when a git-backed stack does not name one.
pub const DEFAULT_COMPOSE_PATH: &str = "docker-compose.yml";

/// Deployment flavour of a stack. Serialized as the platform's integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum StackType {
    Swarm,
    Standalone,
    Kubernetes,
    /// A code this version does not know; kept so metadata round-trips.
    Unknown(i64),
}

impl From<i64> for StackType {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::Swarm,
            2 => Self::Standalone,
            3 => Self::Kubernetes,
            other => Self::Unknown(other),
        }
    }
}

impl From<StackType> for i64 {
    fn from(kind: StackType) -> Self {
        match kind {
            StackType::Swarm => 1,
            StackType::Standalone => 2,
            StackType::Kubernetes => 3,
            StackType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swarm => f.write_str("swarm"),
            Self::Standalone => f.write_str("compose"),
            Self::Kubernetes => f.write_str("kubernetes"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// Where a git-backed stack's definition lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "ReferenceName")]
    pub reference_name: Option<String>,
    #[serde(rename = "ConfigFilePath")]
    pub config_file_path: Option<String>,
    #[serde(rename = "ConfigHash", default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl GitSource {
    /// Repository URL, if one is actually set.
    pub fn repository_url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    /// Git reference, defaulting to `refs/heads/main`.
    pub fn reference(&self) -> &str {
        non_empty(self.reference_name.as_deref()).unwrap_or(DEFAULT_GIT_REFERENCE)
    }

    /// Compose file path inside the repository, defaulting to `docker-compose.yml`.
    pub fn compose_path(&self) -> &str {
        non_empty(self.config_file_path.as_deref()).unwrap_or(DEFAULT_COMPOSE_PATH)
    }
}

impl From<GitConfigResponse> for GitSource {
    fn from(resp: GitConfigResponse) -> Self {
        Self {
            url: resp.url,
            reference_name: resp.reference_name,
            config_file_path: resp.config_file_path,
            config_hash: resp.config_hash,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A deployable stack as the platform reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stack {
    pub id: i64,
    pub name: String,
    pub endpoint_id: i64,
    pub stack_type: StackType,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub git: Option<GitSource>,
    pub swarm_id: Option<String>,
    pub project_path: Option<String>,
    pub namespace: Option<String>,
}

impl Stack {
    /// Repository URL for git-backed stacks.
    pub fn git_url(&self) -> Option<&str> {
        self.git.as_ref().and_then(GitSource::repository_url)
    }
}

impl From<StackResponse> for Stack {
    fn from(resp: StackResponse) -> Self {
        Self {
            id: resp.id,
            name: resp.name,
            endpoint_id: resp.endpoint_id,
            stack_type: StackType::from(resp.stack_type),
            created: resp.creation_date.or(resp.created),
            updated: resp.update_date.or(resp.updated),
            git: resp.git_config.map(GitSource::from),
            swarm_id: resp.swarm_id,
            project_path: resp.project_path,
            namespace: resp.namespace,
        }
    }
}

/// The `.metadata.json` document written next to every stack.
///
/// Absent optional values serialize as `null` so every document has the
/// same set of keys.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackMetadata<'a> {
    pub id: i64,
    pub name: &'a str,
    pub endpoint_id: i64,
    #[serde(rename = "Type")]
    pub stack_type: StackType,
    pub created: Option<&'a Timestamp>,
    pub updated: Option<&'a Timestamp>,
    pub git_config: Option<&'a GitSource>,
    pub swarm_id: Option<&'a str>,
    pub project_path: Option<&'a str>,
    pub namespace: Option<&'a str>,
}

impl<'a> From<&'a Stack> for StackMetadata<'a> {
    fn from(stack: &'a Stack) -> Self {
        Self {
            id: stack.id,
            name: &stack.name,
            endpoint_id: stack.endpoint_id,
            stack_type: stack.stack_type,
            created: stack.created.as_ref(),
            updated: stack.updated.as_ref(),
            git_config: stack.git.as_ref(),
            swarm_id: stack.swarm_id.as_deref(),
            project_path: stack.project_path.as_deref(),
            namespace: stack.namespace.as_deref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn response(value: serde_json::Value) -> StackResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn stack_type_codes_round_trip() {
        assert_eq!(StackType::from(1), StackType::Swarm);
        assert_eq!(StackType::from(2), StackType::Standalone);
        assert_eq!(StackType::from(3), StackType::Kubernetes);
        assert_eq!(StackType::from(9), StackType::Unknown(9));
        assert_eq!(i64::from(StackType::Unknown(9)), 9);
        assert_eq!(StackType::Standalone.to_string(), "compose");
    }

    #[test]
    fn creation_date_preferred_over_created() {
        let stack = Stack::from(response(json!({
            "Id": 1, "Name": "a", "EndpointId": 1, "Type": 2,
            "CreationDate": 100, "Created": 50, "Updated": 70
        })));
        assert_eq!(stack.created, Some(Timestamp::Unix(100)));
        assert_eq!(stack.updated, Some(Timestamp::Unix(70)));
    }

    #[test]
    fn git_defaults_apply_to_empty_values() {
        let git = GitSource {
            url: Some("https://git.example/repo.git".into()),
            reference_name: Some(String::new()),
            config_file_path: None,
            config_hash: None,
        };
        assert_eq!(git.reference(), DEFAULT_GIT_REFERENCE);
        assert_eq!(git.compose_path(), DEFAULT_COMPOSE_PATH);
        assert_eq!(git.repository_url(), Some("https://git.example/repo.git"));
    }

    #[test]
    fn empty_git_url_is_not_a_git_stack() {
        let stack = Stack::from(response(json!({
            "Id": 1, "Name": "a", "EndpointId": 1, "Type": 2,
            "GitConfig": { "URL": "" }
        })));
        assert!(stack.git_url().is_none());
    }

    #[test]
    fn metadata_document_shape() {
        let stack = Stack::from(response(json!({
            "Id": 42, "Name": "my stack", "EndpointId": 5, "Type": 2,
            "CreationDate": 1_700_000_000
        })));

        let doc = serde_json::to_value(StackMetadata::from(&stack)).unwrap();

        assert_eq!(
            doc,
            json!({
                "Id": 42,
                "Name": "my stack",
                "EndpointId": 5,
                "Type": 2,
                "Created": 1_700_000_000,
                "Updated": null,
                "GitConfig": null,
                "SwarmId": null,
                "ProjectPath": null,
                "Namespace": null
            })
        );
    }
}
