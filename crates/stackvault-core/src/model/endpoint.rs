// ── Endpoint domain types ──

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use stackvault_api::EndpointResponse;

/// A managed compute target (host, swarm, cluster) stacks are deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub id: i64,
    /// Display name; `endpoint-<id>` when the platform reported none.
    pub name: String,
}

impl Endpoint {
    /// Name used for an endpoint the platform did not name.
    pub fn fallback_name(id: i64) -> String {
        format!("endpoint-{id}")
    }
}

impl From<EndpointResponse> for Endpoint {
    fn from(resp: EndpointResponse) -> Self {
        let name = match resp.name {
            Some(name) if !name.is_empty() && name != "null" => name,
            _ => Self::fallback_name(resp.id),
        };
        Self { id: resp.id, name }
    }
}

/// Immutable id → display-name lookup, built once per run.
#[derive(Debug, Clone, Default)]
pub struct EndpointDirectory {
    names: BTreeMap<i64, String>,
}

impl EndpointDirectory {
    /// Name for `id`, falling back to `endpoint-<id>` for unknown endpoints.
    pub fn name_for(&self, id: i64) -> Cow<'_, str> {
        self.names
            .get(&id)
            .map_or_else(|| Cow::Owned(Endpoint::fallback_name(id)), |n| Cow::Borrowed(n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Endpoints ordered by id.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.names
            .iter()
            .map(|(id, name)| Endpoint {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }
}

impl FromIterator<Endpoint> for EndpointDirectory {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|e| (e.id, e.name)).collect(),
        }
    }
}
