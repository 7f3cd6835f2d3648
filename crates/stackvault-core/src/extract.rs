// ── Stack content extraction ──
//
// Turns one stack into files under `<run>/<endpoint>/`:
//   stack_<name>-<id>.yaml           compose content, only when non-empty
//   stack_<name>-<id>.metadata.json  always
//   stack_<name>-<id>.README.txt     git-backed stacks without inline content

use std::path::Path;

use stackvault_api::{PlatformClient, RawResponse, StackFileEnvelope};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{AbsenceReason, ContentOutcome, GitSource, Stack, StackArtifact, StackMetadata};

/// Extension of every compose file, whatever the stack's original file was called.
pub const COMPOSE_EXTENSION: &str = "yaml";

/// Make a name safe for use as a single path component.
///
/// Space, `/` and `:` each become `_`. Runs are not collapsed, so the result
/// is a pure character map and applying it twice changes nothing.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | ':' => '_',
            other => other,
        })
        .collect()
}

/// Directory name for an endpoint's files.
///
/// Like [`sanitize_name`], but a name that would resolve to the run directory
/// or its parent (`""`, `.`, `..`) becomes `_`.
pub fn endpoint_folder(name: &str) -> String {
    let safe = sanitize_name(name);
    match safe.as_str() {
        "" | "." | ".." => "_".to_owned(),
        _ => safe,
    }
}

// ── Response decoding ────────────────────────────────────────────────

/// The stack-file response, classified.
///
/// Depending on version and stack kind the platform answers with a JSON
/// envelope `{"StackFileContent": "..."}`, with the compose text itself, or
/// with nothing at all. Raw bodies stay bytes: the compose file is written
/// exactly as served, whatever its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeSource {
    /// Empty or whitespace-only body.
    Empty,
    /// A decoded JSON envelope; `None` when the field is missing.
    Envelope(Option<String>),
    /// Started with `{` but did not decode as an envelope.
    Unrecognized(Vec<u8>),
    /// Compose text, kept verbatim.
    Raw(Vec<u8>),
}

impl ComposeSource {
    pub fn decode(resp: RawResponse) -> Self {
        let labelled_json = resp.is_json();
        let body = resp.body;
        if body.trim_ascii().is_empty() {
            return Self::Empty;
        }

        let opens_object = body.trim_ascii_start().starts_with(b"{");
        if !labelled_json && !opens_object {
            return Self::Raw(body);
        }

        match serde_json::from_slice::<StackFileEnvelope>(&body) {
            Ok(envelope) => Self::Envelope(envelope.stack_file_content),
            // A JSON content type alone does not make YAML an envelope.
            Err(e) if !opens_object => {
                debug!(error = %e, "JSON-labelled stack file is not an object, keeping it raw");
                Self::Raw(body)
            }
            Err(e) => {
                debug!(error = %e, "stack file response is not a valid envelope");
                Self::Unrecognized(body)
            }
        }
    }

    /// Non-empty compose content, or why there is none.
    pub fn content(&self) -> Result<&[u8], AbsenceReason> {
        match self {
            Self::Empty => Err(AbsenceReason::EmptyResponse),
            Self::Envelope(Some(content)) if !content.is_empty() => Ok(content.as_bytes()),
            Self::Envelope(_) => Err(AbsenceReason::NoInlineContent),
            Self::Unrecognized(_) => Err(AbsenceReason::UnrecognizedResponse),
            Self::Raw(content) => Ok(content),
        }
    }
}

// ── Extraction ───────────────────────────────────────────────────────

/// Fetch and write one stack.
///
/// Fetch and decode problems end up in the artifact as absent content. Only
/// local write failures are returned as errors.
pub async fn extract_stack(
    client: &PlatformClient,
    stack: &Stack,
    endpoint_name: &str,
    run_dir: &Path,
) -> Result<StackArtifact, CoreError> {
    let source = match client.stack_file(stack.id).await {
        Ok(resp) => Some(ComposeSource::decode(resp)),
        Err(e) => {
            warn!(stack = %stack.name, id = stack.id, error = %e, "could not fetch stack file");
            None
        }
    };
    let content = source
        .as_ref()
        .map_or(Err(AbsenceReason::FetchFailed), ComposeSource::content);

    write_artifact(stack, endpoint_name, run_dir, content).await
}

/// Write the files for one stack given its resolved content.
pub async fn write_artifact(
    stack: &Stack,
    endpoint_name: &str,
    run_dir: &Path,
    content: Result<&[u8], AbsenceReason>,
) -> Result<StackArtifact, CoreError> {
    let dir = run_dir.join(endpoint_folder(endpoint_name));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| CoreError::io(&dir, e))?;

    let stem = format!("stack_{}-{}", sanitize_name(&stack.name), stack.id);

    let (outcome, content_file) = match content {
        Ok(bytes) => {
            let path = dir.join(format!("{stem}.{COMPOSE_EXTENSION}"));
            write_file(&path, bytes).await?;
            info!(stack = %stack.name, id = stack.id, path = %path.display(), "saved compose file");
            (ContentOutcome::Written { bytes: bytes.len() }, Some(path))
        }
        Err(reason) => {
            info!(stack = %stack.name, id = stack.id, %reason, "no compose content");
            (ContentOutcome::Absent { reason }, None)
        }
    };

    let metadata_file = dir.join(format!("{stem}.metadata.json"));
    let mut doc = serde_json::to_vec_pretty(&StackMetadata::from(stack))
        .map_err(|e| CoreError::io(&metadata_file, std::io::Error::other(e)))?;
    doc.push(b'\n');
    write_file(&metadata_file, &doc).await?;

    let provenance_file = match (&content_file, stack.git.as_ref()) {
        (None, Some(git)) if git.repository_url().is_some() => {
            let path = dir.join(format!("{stem}.README.txt"));
            write_file(&path, provenance_note(stack, git).as_bytes()).await?;
            debug!(stack = %stack.name, path = %path.display(), "wrote git provenance note");
            Some(path)
        }
        _ => None,
    };

    Ok(StackArtifact {
        stack_id: stack.id,
        stack_name: stack.name.clone(),
        endpoint: endpoint_name.to_owned(),
        content: outcome,
        content_file,
        metadata_file,
        provenance_file,
    })
}

fn provenance_note(stack: &Stack, git: &GitSource) -> String {
    format!(
        "Stack '{name}' (id {id}) is deployed from a git repository.\n\
         Its compose file is not stored by the platform.\n\
         \n\
         Repository:   {url}\n\
         Reference:    {reference}\n\
         Compose file: {path}\n",
        name = stack.name,
        id = stack.id,
        url = git.repository_url().unwrap_or_default(),
        reference = git.reference(),
        path = git.compose_path(),
    )
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stackvault_api::StackResponse;

    use super::*;
    use crate::model::StackType;

    fn text(body: &str, content_type: Option<&str>) -> RawResponse {
        raw(body.as_bytes(), content_type)
    }

    fn raw(body: &[u8], content_type: Option<&str>) -> RawResponse {
        RawResponse {
            body: body.to_vec(),
            content_type: content_type.map(str::to_owned),
        }
    }

    fn stack(value: serde_json::Value) -> Stack {
        Stack::from(serde_json::from_value::<StackResponse>(value).unwrap())
    }

    // ── sanitize_name ────────────────────────────────────────────────

    #[test]
    fn sanitize_replaces_each_character() {
        assert_eq!(sanitize_name("my stack"), "my_stack");
        assert_eq!(sanitize_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_name("a  b"), "a__b");
        assert_eq!(sanitize_name("plain-name.v2"), "plain-name.v2");
    }

    #[test]
    fn endpoint_folder_never_escapes_the_run_dir() {
        assert_eq!(endpoint_folder("."), "_");
        assert_eq!(endpoint_folder(".."), "_");
        assert_eq!(endpoint_folder(""), "_");
        assert_eq!(endpoint_folder("..."), "...");
        assert_eq!(endpoint_folder("prod east"), "prod_east");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["my stack", "x:/ y", "", "already_safe", "ünïcode name"] {
            let once = sanitize_name(name);
            assert_eq!(sanitize_name(&once), once);
        }
    }

    // ── decode ───────────────────────────────────────────────────────

    #[test]
    fn raw_text_is_kept_verbatim() {
        let body = "services:\n  web:\n    image: nginx\n";
        let source = ComposeSource::decode(text(body, Some("text/plain")));
        assert_eq!(source, ComposeSource::Raw(body.as_bytes().to_vec()));
        assert_eq!(source.content(), Ok(body.as_bytes()));
    }

    #[test]
    fn raw_bytes_survive_any_charset() {
        let body = b"x: caf\xe9\n";
        for content_type in [Some("text/plain"), Some("text/plain; charset=iso-8859-1"), None] {
            let source = ComposeSource::decode(raw(body, content_type));
            assert_eq!(source.content(), Ok(&body[..]));
        }
    }

    #[test]
    fn json_labelled_yaml_is_kept_raw() {
        let body = "services:\n  web:\n    image: nginx\n";
        let source = ComposeSource::decode(text(body, Some("application/json")));
        assert_eq!(source.content(), Ok(body.as_bytes()));
    }

    #[test]
    fn json_labelled_object_that_fails_is_unrecognized() {
        let source = ComposeSource::decode(text("{\"StackFileContent\": 3}", Some("application/json")));
        assert_eq!(source.content(), Err(AbsenceReason::UnrecognizedResponse));
    }

    #[test]
    fn envelope_field_is_extracted_exactly() {
        let body = json!({ "StackFileContent": "version: '3'\nservices: {}\n" }).to_string();
        let source = ComposeSource::decode(text(&body, Some("application/json")));
        assert_eq!(source.content(), Ok(&b"version: '3'\nservices: {}\n"[..]));
    }

    #[test]
    fn envelope_detected_without_content_type() {
        let source = ComposeSource::decode(text("  {\"StackFileContent\":\"x: 1\"}", None));
        assert_eq!(source.content(), Ok(&b"x: 1"[..]));
    }

    #[test]
    fn absent_content_reasons() {
        assert_eq!(
            ComposeSource::decode(text("", None)).content(),
            Err(AbsenceReason::EmptyResponse)
        );
        assert_eq!(
            ComposeSource::decode(text(" \n\t", None)).content(),
            Err(AbsenceReason::EmptyResponse)
        );
        assert_eq!(
            ComposeSource::decode(text("{}", None)).content(),
            Err(AbsenceReason::NoInlineContent)
        );
        assert_eq!(
            ComposeSource::decode(text(r#"{"StackFileContent":""}"#, None)).content(),
            Err(AbsenceReason::NoInlineContent)
        );
        assert_eq!(
            ComposeSource::decode(text("{not json", None)).content(),
            Err(AbsenceReason::UnrecognizedResponse)
        );
    }

    // ── write_artifact ───────────────────────────────────────────────

    #[tokio::test]
    async fn writes_content_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let stack = stack(json!({ "Id": 42, "Name": "my stack", "EndpointId": 5, "Type": 2 }));

        let artifact = write_artifact(&stack, "endpoint-5", tmp.path(), Ok(&b"services: {}\n"[..]))
            .await
            .unwrap();

        let compose = tmp.path().join("endpoint-5/stack_my_stack-42.yaml");
        assert_eq!(artifact.content_file.as_deref(), Some(compose.as_path()));
        assert_eq!(std::fs::read_to_string(&compose).unwrap(), "services: {}\n");
        assert_eq!(artifact.content, ContentOutcome::Written { bytes: 13 });

        let meta: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&artifact.metadata_file).unwrap()).unwrap();
        assert_eq!(meta["Id"], 42);
        assert_eq!(meta["Name"], "my stack");
        assert_eq!(meta["EndpointId"], 5);
        assert_eq!(meta["Type"], i64::from(StackType::Standalone));
        assert!(artifact.provenance_file.is_none());
    }

    #[tokio::test]
    async fn git_stack_without_content_gets_provenance() {
        let tmp = tempfile::tempdir().unwrap();
        let stack = stack(json!({
            "Id": 7, "Name": "git app", "EndpointId": 1, "Type": 2,
            "GitConfig": { "URL": "https://git.example/app.git" }
        }));

        let artifact = write_artifact(
            &stack,
            "prod: east",
            tmp.path(),
            Err(AbsenceReason::NoInlineContent),
        )
        .await
        .unwrap();

        let dir = tmp.path().join("prod__east");
        assert!(!dir.join("stack_git_app-7.yaml").exists());
        assert!(dir.join("stack_git_app-7.metadata.json").exists());

        let note = std::fs::read_to_string(dir.join("stack_git_app-7.README.txt")).unwrap();
        assert!(note.contains("https://git.example/app.git"));
        assert!(note.contains("refs/heads/main"));
        assert!(note.contains("docker-compose.yml"));
        assert_eq!(
            artifact.content,
            ContentOutcome::Absent {
                reason: AbsenceReason::NoInlineContent
            }
        );
    }

    #[tokio::test]
    async fn dot_endpoint_stays_inside_run_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let run_dir = tmp.path().join("2026-01-02");
        let stack = stack(json!({ "Id": 4, "Name": "web", "EndpointId": 9, "Type": 2 }));

        let artifact = write_artifact(&stack, "..", &run_dir, Ok(&b"a: 1\n"[..]))
            .await
            .unwrap();

        assert_eq!(artifact.metadata_file, run_dir.join("_/stack_web-4.metadata.json"));
        assert!(run_dir.join("_/stack_web-4.yaml").exists());
        assert!(!tmp.path().join("stack_web-4.yaml").exists());
    }

    #[tokio::test]
    async fn plain_stack_without_content_gets_metadata_only() {
        let tmp = tempfile::tempdir().unwrap();
        let stack = stack(json!({ "Id": 3, "Name": "k8s", "EndpointId": 2, "Type": 3 }));

        let artifact = write_artifact(&stack, "cluster", tmp.path(), Err(AbsenceReason::EmptyResponse))
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("cluster"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["stack_k8s-3.metadata.json".to_owned()]);
        assert!(!artifact.has_content());
        assert!(artifact.provenance_file.is_none());
    }
}
