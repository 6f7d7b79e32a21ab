//! HTTP client for the attestation service's verification endpoint.

pub mod attestation_client;
pub mod builder;

pub use attestation_client::AttestationClient;
pub use builder::AttestationClientBuilder;

// The gateway normally runs on the same host as the attested workload
pub const ATTESTATION_DEFAULT_HOST: &str = "localhost";
pub const ATTESTATION_DEFAULT_PORT: u16 = 8081;
pub const ATTESTATION_API_PATH: &str = "/api/attestation-service/attestation";
pub const ATTESTATION_DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Header carrying the JSON encoded [`crate::request_types::coco_as::IdentityContext`].
pub const INSTANCE_INFO_HEADER: &str = "AAInstanceInfo";
