// stackvault-api: Async client for the container-platform REST API
//
// Covers exactly the calls a configuration backup needs: the platform
// export, endpoint and stack listings, and per-stack compose files.

pub mod client;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::PlatformClient;
pub use error::Error;
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    BackupRequest, EndpointResponse, GitConfigResponse, RawResponse, StackFileEnvelope,
    StackResponse, Timestamp,
};
