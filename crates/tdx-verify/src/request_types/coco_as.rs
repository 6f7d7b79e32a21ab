use kbs_types::Tee;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use std::io;

/// Policy evaluated by the attestation service when none is configured.
pub const DEFAULT_POLICY_ID: &str = "tapp";

/// Body of a `POST /api/attestation-service/attestation` call.
///
/// The service accepts a batch, but this client always sends a single
/// evidence/policy pairing.
///
/// # Fields
///
/// - `verification_requests`: the evidence to evaluate, tagged with its TEE type.
/// - `policy_ids`: the policies the evidence is checked against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub verification_requests: Vec<EvidenceEntry>,
    pub policy_ids: Vec<String>,
}

impl VerificationRequest {
    /// Builds a one-element request for base64 encoded TDX evidence.
    pub fn tdx(evidence: impl Into<String>, policy_id: impl Into<String>) -> Self {
        Self {
            verification_requests: vec![EvidenceEntry {
                tee: Tee::Tdx,
                evidence: evidence.into(),
            }],
            policy_ids: vec![policy_id.into()],
        }
    }
}

/// One piece of evidence inside a [`VerificationRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EvidenceEntry {
    pub tee: Tee,
    pub evidence: String,
}

/// Identity of the instance that produced the evidence.
///
/// Sent to the service as the JSON value of the `AAInstanceInfo` header.
/// Every field is independently optional; empty strings count as absent so
/// unset environment variables can be passed straight through.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_account_id: Option<String>,
}

impl IdentityContext {
    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = non_empty(image_id.into());
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = non_empty(instance_id.into());
        self
    }

    pub fn with_instance_name(mut self, instance_name: impl Into<String>) -> Self {
        self.instance_name = non_empty(instance_name.into());
        self
    }

    pub fn with_owner_account_id(mut self, owner_account_id: impl Into<String>) -> Self {
        self.owner_account_id = non_empty(owner_account_id.into());
        self
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        [
            &self.image_id,
            &self.instance_id,
            &self.instance_name,
            &self.owner_account_id,
        ]
        .iter()
        .all(|field| field.as_deref().map_or(true, str::is_empty))
    }

    /// Compact JSON header value, or `None` when the context should be omitted.
    pub fn to_header_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let normalized = Self {
            image_id: self.image_id.clone().and_then(non_empty),
            instance_id: self.instance_id.clone().and_then(non_empty),
            instance_name: self.instance_name.clone().and_then(non_empty),
            owner_account_id: self.owner_account_id.clone().and_then(non_empty),
        };
        let mut header = Vec::new();
        normalized
            .serialize(&mut Serializer::with_formatter(&mut header, AsciiFormatter))
            .ok()?;
        String::from_utf8(header).ok()
    }
}

/// Compact JSON with every non-ASCII character written as a `\u` escape,
/// so the result is always a valid header value.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
