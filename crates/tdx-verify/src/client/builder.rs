use std::time::Duration;
use tracing::warn;

use super::{
    AttestationClient, ATTESTATION_API_PATH, ATTESTATION_DEFAULT_HOST, ATTESTATION_DEFAULT_PORT,
    ATTESTATION_DEFAULT_TIMEOUT_SECONDS,
};
use crate::errors::VerifyError;

/// Builder for [`AttestationClient`].
///
/// Without an explicit [`url`](Self::url) the endpoint is
/// `http://{addr}:{port}/api/attestation-service/attestation`.
#[derive(Debug, Clone)]
pub struct AttestationClientBuilder {
    addr: Option<String>,
    port: Option<u16>,
    timeout: Option<Duration>,
    url: Option<String>,
    insecure_skip_verify: bool,
}

impl Default for AttestationClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AttestationClientBuilder {
    pub fn new() -> Self {
        Self {
            addr: None,
            port: None,
            timeout: Some(Duration::from_secs(ATTESTATION_DEFAULT_TIMEOUT_SECONDS)),
            url: None,
            insecure_skip_verify: false,
        }
    }

    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Lets a request wait on the service indefinitely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Full endpoint URL; takes precedence over `addr` and `port`.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Accept any TLS certificate presented by the service.
    ///
    /// This removes server authentication from an `https` endpoint and must
    /// only be enabled when the service is reached over a trusted path.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    pub fn build(self) -> Result<AttestationClient, VerifyError> {
        let url = self.url.unwrap_or_else(|| {
            format!(
                "http://{}:{}{}",
                self.addr
                    .unwrap_or_else(|| ATTESTATION_DEFAULT_HOST.to_string()),
                self.port.unwrap_or(ATTESTATION_DEFAULT_PORT),
                ATTESTATION_API_PATH
            )
        });

        // certificates only exist on https endpoints
        let skip_tls_verify = self.insecure_skip_verify && is_https(&url);
        if skip_tls_verify {
            warn!(%url, "TLS certificate verification is disabled for the attestation service");
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .map_err(VerifyError::ClientBuild)?;

        Ok(AttestationClient::from_parts(http, url, skip_tls_verify))
    }
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}
