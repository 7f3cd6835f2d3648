// Hand-crafted async HTTP client for the platform REST API.
//
// Base path: /api/
// Auth: X-API-Key header

use std::path::Path;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::retry::{self, RetryPolicy};
use crate::transport::TransportConfig;
use crate::types::{BackupRequest, EndpointResponse, RawResponse, StackResponse};

// ── Error response shape from the platform ───────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the platform API.
///
/// Every request goes through the configured [`RetryPolicy`]; the API key is
/// injected once as a default header.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl PlatformClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-Key` as a default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::InvalidApiKey)?;
        key_value.set_sensitive(true);
        headers.insert("X-API-Key", key_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            retry: transport.retry.clone(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    /// Normalize to the platform root with a trailing slash.
    ///
    /// `https://host`, `https://host/` and `https://host/api` all become
    /// `https://host/`; a reverse-proxy sub-path such as `/portainer` is kept.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;

        let path = url.path().trim_end_matches('/');
        let path = path.strip_suffix("/api").unwrap_or(path).to_owned();
        url.set_path(&format!("{path}/"));

        Ok(url)
    }

    /// The normalized platform root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative API path (e.g. `"stacks"`) onto `{base}/api/`.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("api/{path}"))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    /// GET a path and return the undecoded body, retrying per policy.
    pub async fn get_raw(&self, path: &str) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        let url = &url;
        let http = &self.http;

        retry::retrying(&self.retry, &format!("GET {path}"), || async move {
            debug!("GET {url}");
            let resp = check_status(http.get(url.clone()).send().await?).await?;
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = resp.bytes().await?.to_vec();
            Ok(RawResponse { body, content_type })
        })
        .await
    }

    /// GET a path and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.get_raw(path).await?;
        serde_json::from_slice(&resp.body).map_err(|e| {
            let body = String::from_utf8_lossy(&resp.body).into_owned();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// POST a JSON body and stream the response verbatim into `dest`.
    ///
    /// Returns the number of bytes written. A failed attempt never leaves a
    /// partial file behind.
    pub async fn post_download<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        dest: &Path,
    ) -> Result<u64, Error> {
        let url = self.url(path)?;
        let url = &url;
        let http = &self.http;

        retry::retrying(&self.retry, &format!("POST {path}"), || async move {
            debug!("POST {url} -> {}", dest.display());
            let resp = check_status(http.post(url.clone()).json(body).send().await?).await?;
            match write_body(resp, dest).await {
                Ok(written) => Ok(written),
                Err(e) => {
                    let _ = tokio::fs::remove_file(dest).await;
                    Err(e)
                }
            }
        })
        .await
    }

    // ── Platform calls ───────────────────────────────────────────────

    /// `GET /api/endpoints`
    pub async fn list_endpoints(&self) -> Result<Vec<EndpointResponse>, Error> {
        self.get_json("endpoints").await
    }

    /// `GET /api/stacks`
    pub async fn list_stacks(&self) -> Result<Vec<StackResponse>, Error> {
        self.get_json("stacks").await
    }

    /// `GET /api/stacks/{id}/file`, undecoded.
    ///
    /// The platform answers with either a JSON envelope or the raw compose
    /// text depending on version and stack kind; the caller disambiguates.
    pub async fn stack_file(&self, stack_id: i64) -> Result<RawResponse, Error> {
        self.get_raw(&format!("stacks/{stack_id}/file")).await
    }

    /// `POST /api/backup`, saving the archive to `dest`.
    pub async fn download_backup(
        &self,
        password: Option<&SecretString>,
        dest: &Path,
    ) -> Result<u64, Error> {
        let body = BackupRequest {
            password: password.map_or("", ExposeSecret::expose_secret),
        };
        self.post_download("backup", &body, dest).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::InvalidApiKey;
    }

    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse {
            message: Some(message),
            details,
        }) => match details {
            Some(details) if !details.is_empty() && details != message => {
                format!("{message}: {details}")
            }
            _ => message,
        },
        _ if raw.is_empty() => status.to_string(),
        _ => raw,
    };

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

async fn write_body(mut resp: reqwest::Response, dest: &Path) -> Result<u64, Error> {
    let io_err = |source| Error::Io {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
    let mut written: u64 = 0;

    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_normalization() {
        let cases = [
            ("https://host", "https://host/"),
            ("https://host/", "https://host/"),
            ("https://host:9443/api", "https://host:9443/"),
            ("https://host/api/", "https://host/"),
            ("https://host/portainer", "https://host/portainer/"),
        ];
        for (raw, expected) in cases {
            let url = PlatformClient::normalize_base_url(raw).unwrap();
            assert_eq!(url.as_str(), expected, "normalizing {raw}");
        }
    }

    #[test]
    fn api_paths_join_under_api() {
        let client = PlatformClient::from_reqwest(
            "https://host/portainer",
            reqwest::Client::new(),
            RetryPolicy::none(),
        )
        .unwrap();
        assert_eq!(
            client.url("stacks/3/file").unwrap().as_str(),
            "https://host/portainer/api/stacks/3/file"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result =
            PlatformClient::from_reqwest("not a url", reqwest::Client::new(), RetryPolicy::none());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
