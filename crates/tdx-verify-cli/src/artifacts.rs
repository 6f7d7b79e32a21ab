//! Files left behind by a successful run for later inspection.
//!
//! Both are overwritten on every run that gets a token back.

use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tdx_verify::{SignedToken, VerifyError};
use tracing::debug;

pub const TOKEN_FILE_NAME: &str = "jwt_token.txt";
pub const PAYLOAD_FILE_NAME: &str = "jwt_payload.json";

/// Writes the token exactly as the service returned it.
pub fn write_token(dir: &Path, token: &SignedToken) -> Result<PathBuf, VerifyError> {
    write_artifact(dir.join(TOKEN_FILE_NAME), token.as_str())
}

/// Writes the decoded payload as indented JSON.
pub fn write_payload(dir: &Path, payload: &Value) -> Result<PathBuf, VerifyError> {
    let path = dir.join(PAYLOAD_FILE_NAME);
    match serde_json::to_string_pretty(payload) {
        Ok(pretty) => write_artifact(path, &pretty),
        Err(e) => Err(VerifyError::Artifact {
            path,
            source: io::Error::from(e),
        }),
    }
}

fn write_artifact(path: PathBuf, contents: &str) -> Result<PathBuf, VerifyError> {
    match fs::write(&path, contents) {
        Ok(()) => {
            debug!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
            Ok(path)
        }
        Err(source) => Err(VerifyError::Artifact { path, source }),
    }
}
