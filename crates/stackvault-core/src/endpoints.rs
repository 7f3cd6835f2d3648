// ── Endpoint resolution ──

use stackvault_api::PlatformClient;
use tracing::{debug, info};

use crate::model::{Endpoint, EndpointDirectory};

/// Fetch all endpoints and build the id → name directory.
///
/// Errors are returned untouched; the failure policy decides what they mean.
pub async fn resolve_endpoints(
    client: &PlatformClient,
) -> Result<EndpointDirectory, stackvault_api::Error> {
    let endpoints = client.list_endpoints().await?;
    let directory: EndpointDirectory = endpoints
        .into_iter()
        .map(Endpoint::from)
        .inspect(|ep| debug!(id = ep.id, name = %ep.name, "endpoint"))
        .collect();
    info!(count = directory.len(), "resolved endpoints");
    Ok(directory)
}
