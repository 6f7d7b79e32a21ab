//! Human readable report printed on stdout.

use serde_json::Value;
use std::error::Error;
use std::io::{self, Write};
use tdx_verify::{AttestationSummary, ErrorBody, MissingField, TrustTier};

const NOT_AVAILABLE: &str = "N/A";

/// Formats a claim value for display. Strings are shown without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// An error followed by each of its causes, `: ` separated.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn missing(out: &mut impl Write, field: &MissingField) -> io::Result<()> {
    writeln!(out, "✗ JWT payload {field}")
}

pub fn header(out: &mut impl Write, header: &Value) -> io::Result<()> {
    writeln!(out, "========== JWT Header ==========")?;
    writeln!(out, "{}", pretty(header))?;
    writeln!(out)
}

pub fn payload(out: &mut impl Write, payload: &Value) -> io::Result<()> {
    writeln!(out, "========== JWT Payload (full) ==========")?;
    writeln!(out, "{}", pretty(payload))?;
    writeln!(out)
}

pub fn rejection(out: &mut impl Write, body: &ErrorBody) -> io::Result<()> {
    writeln!(out, "✗ TDX quote verification failed")?;
    match body {
        ErrorBody::Json(_) => {
            writeln!(out, "error response:")?;
            writeln!(out, "{body}")
        }
        ErrorBody::Text(text) => writeln!(out, "error response: {text}"),
    }
}

/// A trust dimension, followed by its AR4SI tier when `with_tier` is set and
/// the value can be classified.
fn trust_claim(claim: Option<&Value>, with_tier: bool) -> String {
    match claim {
        None => NOT_AVAILABLE.to_string(),
        Some(value) => match (value, TrustTier::from_claim(value)) {
            (Value::Number(_), Some(tier)) if with_tier => {
                format!("{} ({tier})", display_value(value))
            }
            _ => display_value(value),
        },
    }
}

/// Prints the verification result section.
///
/// Each item is printed on its own so a gap in the payload only replaces
/// that item with a `✗` line. Verbose mode adds trust tiers and the
/// cryptpilot entries.
pub fn summary(
    out: &mut impl Write,
    summary: &AttestationSummary,
    verbose: bool,
) -> io::Result<()> {
    writeln!(out, "========== verification result ==========")?;
    match &summary.status {
        Ok(status) => writeln!(out, "verification status: {}", display_value(status))?,
        Err(field) => missing(out, field)?,
    }

    writeln!(out)?;
    match &summary.trust_vector {
        Ok(vector) => {
            writeln!(out, "trustworthiness vector:")?;
            for (name, claim) in vector.dimensions() {
                writeln!(out, "  - {name}: {}", trust_claim(claim, verbose))?;
            }
        }
        Err(field) => missing(out, field)?,
    }

    writeln!(out)?;
    match &summary.report_data {
        Ok(report_data) => writeln!(out, "Report Data: {}", display_value(report_data))?,
        Err(field) => missing(out, field)?,
    }

    writeln!(out)?;
    writeln!(out, "========== Start App logs ==========")?;
    match &summary.start_app {
        Ok(entries) if entries.is_empty() => writeln!(out, "start_app log not found")?,
        Ok(entries) => {
            for details in entries {
                writeln!(out, "{}", pretty(details))?;
            }
        }
        Err(field) => missing(out, field)?,
    }

    if verbose {
        writeln!(out)?;
        writeln!(out, "========== Cryptpilot logs ==========")?;
        match &summary.cryptpilot {
            Ok(entries) if entries.is_empty() => writeln!(out, "cryptpilot log not found")?,
            Ok(entries) => {
                for entry in entries {
                    let operation = entry.operation.as_ref().map(display_value);
                    let content = entry.content.as_ref().map(display_value);
                    writeln!(out, "Operation: {}", operation.as_deref().unwrap_or(NOT_AVAILABLE))?;
                    writeln!(out, "Content: {}", content.as_deref().unwrap_or(NOT_AVAILABLE))?;
                    writeln!(out)?;
                }
            }
            Err(field) => missing(out, field)?,
        }
    }

    Ok(())
}
