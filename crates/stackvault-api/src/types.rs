// Wire types for the platform API.
//
// Field names follow the platform's PascalCase JSON. Anything the backup does
// not need is ignored on the way in; `Authentication` blocks inside git
// configs are not modelled and never reach output.

use serde::{Deserialize, Serialize};

// ── Endpoints ────────────────────────────────────────────────────────

/// One entry of `GET /api/endpoints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointResponse {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

// ── Stacks ───────────────────────────────────────────────────────────

/// A creation/update timestamp as the platform reported it.
///
/// Current releases send unix seconds; older ones sent strings. The original
/// shape is kept so metadata output mirrors the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Unix(i64),
    Text(String),
}

/// Git source of a git-backed stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfigResponse {
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(rename = "ReferenceName", default)]
    pub reference_name: Option<String>,
    #[serde(rename = "ConfigFilePath", default)]
    pub config_file_path: Option<String>,
    #[serde(rename = "ConfigHash", default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// One entry of `GET /api/stacks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResponse {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "EndpointId", default)]
    pub endpoint_id: i64,
    /// 1 = swarm, 2 = standalone compose, 3 = kubernetes.
    #[serde(rename = "Type", default)]
    pub stack_type: i64,
    #[serde(rename = "CreationDate", default)]
    pub creation_date: Option<Timestamp>,
    /// Older spelling of `CreationDate`.
    #[serde(rename = "Created", default)]
    pub created: Option<Timestamp>,
    #[serde(rename = "UpdateDate", default)]
    pub update_date: Option<Timestamp>,
    /// Older spelling of `UpdateDate`.
    #[serde(rename = "Updated", default)]
    pub updated: Option<Timestamp>,
    #[serde(rename = "GitConfig", default)]
    pub git_config: Option<GitConfigResponse>,
    #[serde(rename = "SwarmId", default)]
    pub swarm_id: Option<String>,
    #[serde(rename = "ProjectPath", default)]
    pub project_path: Option<String>,
    #[serde(rename = "Namespace", default)]
    pub namespace: Option<String>,
}

/// JSON envelope returned by `GET /api/stacks/{id}/file`.
///
/// The field is missing for git- and kubernetes-backed stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StackFileEnvelope {
    #[serde(rename = "StackFileContent", default)]
    pub stack_file_content: Option<String>,
}

// ── Backup ───────────────────────────────────────────────────────────

/// Body of `POST /api/backup`. An empty password produces an unencrypted archive.
#[derive(Debug, Serialize)]
pub struct BackupRequest<'a> {
    pub password: &'a str,
}

// ── Raw responses ────────────────────────────────────────────────────

/// A successful response body, byte for byte, with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl RawResponse {
    /// Whether the server labelled the body as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            ct.split(';')
                .next()
                .is_some_and(|mime| {
                    let mime = mime.trim();
                    mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
                })
        })
    }
}
