mod support;

use serde_json::{json, Value};
use serial_test::serial;
use std::fs;
use std::path::Path;
use support::{config_for, write_evidence};
use tdx_verify::{VerifyError, ATTESTATION_API_PATH};
use tdx_verify_cli::artifacts::{PAYLOAD_FILE_NAME, TOKEN_FILE_NAME};
use tdx_verify_cli::{run, CliError, RunReport, VerifierConfig};
use tdx_verify_test_utils::{ear_payload, token_for, StubService};
use tempfile::tempdir;

fn run_captured(config: &VerifierConfig) -> (Result<RunReport, CliError>, String) {
    let mut out = Vec::new();
    let result = run(config, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn read_payload_file(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(PAYLOAD_FILE_NAME)).unwrap()).unwrap()
}

fn assert_no_artifacts(dir: &Path) {
    assert!(!dir.join(TOKEN_FILE_NAME).exists());
    assert!(!dir.join(PAYLOAD_FILE_NAME).exists());
}

#[test]
fn test_successful_verification_writes_both_artifacts() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=", "tee": "tdx" }));
    let token = token_for(&ear_payload());
    let stub = StubService::respond_with(200, token.clone());

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);
    let report = result.unwrap();

    let request = stub.single_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, ATTESTATION_API_PATH);
    assert_eq!(
        request.json_body(),
        json!({
            "verification_requests": [{ "tee": "tdx", "evidence": "ZXZpZGVuY2U=" }],
            "policy_ids": ["tapp"]
        })
    );
    assert_eq!(request.header("AAInstanceInfo"), None);

    assert_eq!(fs::read_to_string(dir.path().join(TOKEN_FILE_NAME)).unwrap(), token);
    assert_eq!(read_payload_file(dir.path()), ear_payload());
    assert_eq!(report.payload_path, Some(dir.path().join(PAYLOAD_FILE_NAME)));
    assert!(report.token_errors.is_empty());

    let preamble = [
        "read evidence file: evidence.json...",
        "  - Evidence base64 length: 12",
        "  - use Policy ID: tapp",
        "",
        "send verification request...",
        "HTTP status code: 200",
        "✓ TDX quote verification succeeded!",
    ]
    .join("\n");
    assert!(out.starts_with(&preamble), "{out}");
    assert!(out.contains("verification status: affirming\n"));
    assert!(out.contains("  - executables: 3\n"));
    assert!(out.contains("Report Data: 3q2+7w==\n"));
    assert!(out.contains("\"content\": \"sha384:0f1e\""));
    assert!(!out.contains("JWT Header"));
    assert!(!out.contains("Cryptpilot"));
    assert!(out.ends_with("\n✓ JWT token is saved to jwt_token.txt\n"));
}

#[test]
fn test_verbose_shows_token_and_cryptpilot_logs() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let stub = StubService::respond_with(200, token_for(&ear_payload()));

    let config = config_for(stub.port(), dir.path(), true, &[]);
    let (result, out) = run_captured(&config);
    result.unwrap();

    assert!(out.contains(
        "========== JWT Header ==========\n{\n  \"alg\": \"ES256\",\n  \"typ\": \"JWT\"\n}\n"
    ));
    assert!(out.contains("========== JWT Payload (full) ==========\n"));
    assert!(out.contains("✓ JWT payload is saved to jwt_payload.json\n"));
    assert!(out.contains("  - executables: 3 (affirming)\n"));
    assert!(out.contains(
        "========== Cryptpilot logs ==========\nOperation: open_volume\nContent: data0\n"
    ));
}

#[test]
fn test_identity_and_policy_are_sent() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let stub = StubService::respond_with(200, token_for(&ear_payload()));

    let extra = [
        ("POLICY_ID", "strict"),
        ("INSTANCE_ID", "i-1"),
        ("INSTANCE_NAME", ""),
    ];
    let config = config_for(stub.port(), dir.path(), false, &extra);
    let (result, out) = run_captured(&config);
    result.unwrap();

    assert!(out.contains(
        "  - use Policy ID: strict\n  - use AAInstanceInfo: {\"instance_id\":\"i-1\"}\n"
    ));
    let request = stub.single_request();
    assert_eq!(request.header("AAInstanceInfo"), Some(r#"{"instance_id":"i-1"}"#));
    assert_eq!(request.json_body()["policy_ids"], json!(["strict"]));
}

#[test]
fn test_missing_evidence_file_never_contacts_service() {
    let dir = tempdir().unwrap();
    let stub = StubService::respond_with(200, "unused");

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);

    assert!(matches!(
        result,
        Err(CliError::Verify(VerifyError::EvidenceNotFound { .. }))
    ));
    assert_eq!(out, "read evidence file: evidence.json...\n");
    stub.assert_untouched();
    assert_no_artifacts(dir.path());
}

#[test]
fn test_evidence_without_field_never_contacts_service() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "quote": "ZXZpZGVuY2U=" }));
    let stub = StubService::respond_with(200, "unused");

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, _) = run_captured(&config);

    let err = result.unwrap_err();
    assert!(matches!(err, CliError::Verify(VerifyError::EvidenceMissing { .. })));
    assert!(err.to_string().starts_with("'evidence' field not found in"));
    stub.assert_untouched();
    assert_no_artifacts(dir.path());
}

#[test]
fn test_rejection_prints_structured_error() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let stub = StubService::respond_with(403, r#"{"error":"policy tapp denied"}"#);

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        CliError::Verify(VerifyError::HttpStatus { status: 403, .. })
    ));
    assert_eq!(err.to_string(), "attestation service returned HTTP 403");
    let expected = [
        "HTTP status code: 403",
        "✗ TDX quote verification failed",
        "error response:",
        "{",
        "  \"error\": \"policy tapp denied\"",
        "}",
        "",
    ]
    .join("\n");
    assert!(out.ends_with(&expected), "{out}");
    assert_eq!(out.matches("TDX quote verification failed").count(), 1);
    assert_no_artifacts(dir.path());
}

#[test]
fn test_payload_without_status_is_still_saved() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let mut payload = ear_payload();
    payload["submods"]["cpu0"]
        .as_object_mut()
        .unwrap()
        .remove("ear.status");
    let stub = StubService::respond_with(200, token_for(&payload));

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);
    let report = result.unwrap();

    assert_eq!(read_payload_file(dir.path()), payload);
    let summary = report.summary.unwrap();
    assert_eq!(summary.status.unwrap_err().key, "ear.status");
    assert!(out.contains("✗ JWT payload missing field 'ear.status' (/submods/cpu0/ear.status)\n"));
    assert!(out.contains("trustworthiness vector:\n"));
    assert!(out.contains("✓ JWT token is saved to jwt_token.txt"));
}

#[test]
fn test_no_start_app_entries() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let mut payload = ear_payload();
    payload["submods"]["cpu0"]["ear.veraison.annotated-evidence"]["tdx"]["uefi_event_logs"] =
        json!([{ "details": { "data": { "operation": "measure_kernel" } } }]);
    let stub = StubService::respond_with(200, token_for(&payload));

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);
    result.unwrap();

    assert!(out.contains("========== Start App logs ==========\nstart_app log not found\n"));
}

#[test]
fn test_payload_file_round_trips_every_padding_length() {
    for filler in ["", "a", "ab", "abc"] {
        let dir = tempdir().unwrap();
        write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
        let payload = json!({
            "submods": { "cpu0": { "ear.status": "affirming" } },
            "pad": filler
        });
        let stub = StubService::respond_with(200, token_for(&payload));

        let config = config_for(stub.port(), dir.path(), false, &[]);
        run_captured(&config).0.unwrap();

        assert_eq!(read_payload_file(dir.path()), payload, "filler {filler:?}");
    }
}

#[test]
fn test_malformed_token_is_kept_but_not_decoded() {
    let dir = tempdir().unwrap();
    write_evidence(dir.path(), &json!({ "evidence": "ZXZpZGVuY2U=" }));
    let stub = StubService::respond_with(200, "opaque-token");

    let config = config_for(stub.port(), dir.path(), false, &[]);
    let (result, out) = run_captured(&config);
    let report = result.unwrap();

    assert_eq!(fs::read_to_string(&report.token_path).unwrap(), "opaque-token");
    assert!(!dir.path().join(PAYLOAD_FILE_NAME).exists());
    assert_eq!(report.token_errors.len(), 1);
    assert!(out.contains("✗ invalid JWT format: expected 3 segments separated by '.', found 1\n"));
    assert!(out.ends_with("✓ JWT token is saved to jwt_token.txt\n"));
}

#[test]
#[serial]
fn test_config_from_process_environment() {
    std::env::set_var("POLICY_ID", "from-env");
    std::env::set_var("ATTESTATION_PORT", "18081");
    std::env::remove_var("ATTESTATION_HOST");

    let config = VerifierConfig::from_env(true).unwrap();

    std::env::remove_var("POLICY_ID");
    std::env::remove_var("ATTESTATION_PORT");

    assert_eq!(config.policy_id, "from-env");
    assert_eq!(config.port, 18081);
    assert_eq!(config.host, "localhost");
    assert!(config.verbose);
}

#[test]
#[serial]
fn test_invalid_environment_is_rejected() {
    std::env::set_var("ATTESTATION_TIMEOUT_SECS", "-5");
    let result = VerifierConfig::from_env(false);
    std::env::remove_var("ATTESTATION_TIMEOUT_SECS");

    assert!(result.is_err());
}
