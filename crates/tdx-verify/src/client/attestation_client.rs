//! A blocking http client for the attestation service.
//! Constructed from an [`AttestationClientBuilder`].

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info};

use super::{AttestationClientBuilder, INSTANCE_INFO_HEADER};
use crate::errors::{ErrorBody, VerifyError};
use crate::request_types::coco_as::{IdentityContext, VerificationRequest};
use crate::token::SignedToken;

/// Submits evidence to the attestation service and hands back its token.
///
/// One call is one POST. There are no retries: a failed submission is
/// reported to the caller as-is.
#[derive(Debug, Clone)]
pub struct AttestationClient {
    http: reqwest::blocking::Client,
    url: String,
    skip_tls_verify: bool,
}

impl AttestationClient {
    pub fn builder() -> AttestationClientBuilder {
        AttestationClientBuilder::new()
    }

    /// Creates a client for a full endpoint URL with default settings.
    pub fn new(url: impl Into<String>) -> Result<Self, VerifyError> {
        AttestationClientBuilder::new().url(url).build()
    }

    pub(crate) const fn from_parts(
        http: reqwest::blocking::Client,
        url: String,
        skip_tls_verify: bool,
    ) -> Self {
        Self {
            http,
            url,
            skip_tls_verify,
        }
    }

    /// The verification endpoint requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// True when the endpoint is `https` and its certificate is not checked.
    pub const fn skips_tls_verification(&self) -> bool {
        self.skip_tls_verify
    }

    /// Sends TDX evidence for evaluation against `policy_id`.
    ///
    /// `AAInstanceInfo` is only attached when `identity` has at least one
    /// field. On `200 OK` the body is returned untouched as the token; any
    /// other status becomes [`VerifyError::HttpStatus`] carrying the body.
    pub fn submit(
        &self,
        evidence: &str,
        policy_id: &str,
        identity: &IdentityContext,
    ) -> Result<SignedToken, VerifyError> {
        if evidence.is_empty() {
            return Err(VerifyError::EmptyEvidence);
        }

        let request = VerificationRequest::tdx(evidence, policy_id);
        let mut builder = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request);
        if let Some(instance_info) = identity.to_header_value() {
            debug!(%instance_info, "Attaching instance identity");
            builder = builder.header(INSTANCE_INFO_HEADER, instance_info);
        }

        info!(url = %self.url, policy_id, "Sending verification request");
        let response = builder.send().map_err(VerifyError::Network)?;
        let status = response.status();
        let body = response.text().map_err(VerifyError::Network)?;
        debug!(%status, len = body.len(), "Attestation service responded");

        if status == StatusCode::OK {
            Ok(SignedToken::new(body))
        } else {
            Err(VerifyError::HttpStatus {
                status: status.as_u16(),
                body: ErrorBody::from_text(body),
            })
        }
    }
}
