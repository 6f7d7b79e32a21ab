//! One verification run: load, submit, decode, report.

use std::io::Write;
use std::path::PathBuf;
use tdx_verify::{AttestationSummary, EvidenceRecord, TokenError, VerifyError, EVIDENCE_FILE_NAME};
use tracing::{info, warn};

use crate::artifacts::{self, PAYLOAD_FILE_NAME, TOKEN_FILE_NAME};
use crate::config::VerifierConfig;
use crate::render::{self, error_chain};
use crate::CliError;

/// What a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub token_path: PathBuf,
    /// Absent when the payload segment could not be decoded.
    pub payload_path: Option<PathBuf>,
    pub summary: Option<AttestationSummary>,
    /// Problems found while decoding the token. They do not fail the run.
    pub token_errors: Vec<TokenError>,
}

/// Runs the whole verification workflow, writing the report to `out`.
///
/// Evidence and transport failures as well as a rejection by the service
/// are returned as errors, and nothing is written to disk in those cases.
/// Once a token has been received it is always persisted; decoding
/// problems are reported inline and collected in [`RunReport`].
pub fn run<W: Write>(config: &VerifierConfig, out: &mut W) -> Result<RunReport, CliError> {
    writeln!(out, "read evidence file: {EVIDENCE_FILE_NAME}...")?;
    let record = EvidenceRecord::from_file(config.work_dir.join(EVIDENCE_FILE_NAME))?;
    writeln!(out, "  - Evidence base64 length: {}", record.evidence.len())?;
    writeln!(out, "  - use Policy ID: {}", config.policy_id)?;
    if let Some(instance_info) = config.identity.to_header_value() {
        writeln!(out, "  - use AAInstanceInfo: {instance_info}")?;
    }

    let client = config.client()?;
    writeln!(out)?;
    writeln!(out, "send verification request...")?;
    let token = match client.submit(&record.evidence, &config.policy_id, &config.identity) {
        Ok(token) => token,
        Err(VerifyError::HttpStatus { status, body }) => {
            writeln!(out, "HTTP status code: {status}")?;
            render::rejection(out, &body)?;
            return Err(VerifyError::HttpStatus { status, body }.into());
        }
        Err(e) => return Err(e.into()),
    };
    writeln!(out, "HTTP status code: 200")?;
    writeln!(out, "✓ TDX quote verification succeeded!")?;
    writeln!(out)?;

    let token_path = artifacts::write_token(&config.work_dir, &token)?;
    info!(path = %token_path.display(), "Saved attestation token");

    let mut report = RunReport {
        token_path,
        payload_path: None,
        summary: None,
        token_errors: Vec::new(),
    };

    match token.decode() {
        Err(e) => {
            warn!(error = %e, "Attestation token is not a JWT");
            writeln!(out, "✗ {e}")?;
            report.token_errors.push(e);
        }
        Ok(decoded) => {
            match decoded.header {
                Ok(header) => {
                    if config.verbose {
                        render::header(out, &header)?;
                    }
                }
                Err(e) => {
                    warn!(error = %error_chain(&e), "Could not decode token header");
                    writeln!(out, "✗ {}", error_chain(&e))?;
                    report.token_errors.push(e.into());
                }
            }

            match decoded.payload {
                Ok(payload) => {
                    if config.verbose {
                        render::payload(out, &payload)?;
                    }
                    let payload_path = artifacts::write_payload(&config.work_dir, &payload)?;
                    if config.verbose {
                        writeln!(out, "✓ JWT payload is saved to {PAYLOAD_FILE_NAME}")?;
                        writeln!(out)?;
                    }

                    let summary = AttestationSummary::from_payload(&payload);
                    for field in summary.missing_fields() {
                        warn!(%field, "JWT payload missing expected field");
                    }
                    render::summary(out, &summary, config.verbose)?;

                    report.payload_path = Some(payload_path);
                    report.summary = Some(summary);
                }
                Err(e) => {
                    warn!(error = %error_chain(&e), "Could not decode token payload");
                    writeln!(out, "✗ {}", error_chain(&e))?;
                    report.token_errors.push(e.into());
                }
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "✓ JWT token is saved to {TOKEN_FILE_NAME}")?;
    Ok(report)
}
