// ── Stack enumeration ──

use stackvault_api::PlatformClient;
use tracing::info;

use crate::model::Stack;

/// Fetch every stack the API key can see. An empty list is a valid result.
pub async fn list_stacks(client: &PlatformClient) -> Result<Vec<Stack>, stackvault_api::Error> {
    let stacks: Vec<Stack> = client
        .list_stacks()
        .await?
        .into_iter()
        .map(Stack::from)
        .collect();
    info!(count = stacks.len(), "found stacks");
    Ok(stacks)
}
