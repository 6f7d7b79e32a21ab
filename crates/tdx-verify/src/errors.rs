use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// Fatal errors of a verification run.
///
/// Any of these stops the workflow. Problems found while interpreting the
/// returned token are not listed here, see [`crate::token::TokenError`].
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The evidence file does not exist.
    #[error("{} file not found", path.display())]
    EvidenceNotFound { path: PathBuf },

    /// The evidence file exists but could not be read.
    #[error("failed to read {}", path.display())]
    EvidenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The evidence file is not a JSON object.
    #[error("failed to parse {} as JSON", path.display())]
    EvidenceMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The `evidence` field is absent, empty or not a string.
    #[error("'evidence' field not found in {}", path.display())]
    EvidenceMissing { path: PathBuf },

    /// There is no evidence to submit.
    #[error("evidence payload is empty")]
    EmptyEvidence,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Connection, DNS, TLS or timeout failure talking to the service.
    #[error("request error")]
    Network(#[source] reqwest::Error),

    /// The service answered with something other than `200 OK`.
    #[error("attestation service returned HTTP {status}")]
    HttpStatus { status: u16, body: ErrorBody },

    /// An output artifact could not be written.
    #[error("failed to write {}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Body of a rejected attestation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not JSON; kept verbatim.
    Text(String),
}

impl ErrorBody {
    /// Classifies a raw response body.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{value}"),
            },
            Self::Text(text) => f.write_str(text),
        }
    }
}
