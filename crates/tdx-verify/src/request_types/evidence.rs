use serde::Deserialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::errors::VerifyError;

/// Default name of the evidence file, looked up in the working directory.
pub const EVIDENCE_FILE_NAME: &str = "evidence.json";

/// Evidence produced by an attestation agent, as stored on disk.
///
/// Only the `evidence` field is used. It holds the base64 encoded TDX quote
/// and event log exactly as the attestation service expects to receive it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvidenceRecord {
    pub evidence: String,
}

impl EvidenceRecord {
    /// Reads and validates an evidence record.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => VerifyError::EvidenceNotFound {
                path: path.to_path_buf(),
            },
            _ => VerifyError::EvidenceRead {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let record = Self::from_json(&raw, path)?;
        debug!(path = %path.display(), len = record.evidence.len(), "Loaded evidence");
        Ok(record)
    }

    fn from_json(raw: &str, path: &Path) -> Result<Self, VerifyError> {
        let document: Value =
            serde_json::from_str(raw).map_err(|source| VerifyError::EvidenceMalformed {
                path: path.to_path_buf(),
                source,
            })?;

        // a bare string or array has no `evidence` key either
        match document.get("evidence").and_then(Value::as_str) {
            Some(evidence) if !evidence.is_empty() => Ok(Self {
                evidence: evidence.to_string(),
            }),
            _ => Err(VerifyError::EvidenceMissing {
                path: path.to_path_buf(),
            }),
        }
    }
}
