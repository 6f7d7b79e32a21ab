use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

/// Compact token around `payload` with a placeholder signature.
pub fn token_for(payload: &Value) -> String {
    let header = json!({ "alg": "ES256", "typ": "JWT" });
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// An EAR payload shaped like the attestation service's output.
pub fn ear_payload() -> Value {
    json!({
        "eat_profile": "tag:github.com,2023:veraison/ear",
        "iat": 1_700_000_000,
        "submods": {
            "cpu0": {
                "ear.status": "affirming",
                "ear.trustworthiness-vector": {
                    "configuration": 2,
                    "executables": 3,
                    "file-system": 2,
                    "hardware": 2
                },
                "ear.veraison.annotated-evidence": {
                    "tdx": {
                        "quote": { "body": { "report_data": "3q2+7w==" } },
                        "uefi_event_logs": [
                            { "event_type": "EV_SEPARATOR", "details": {} },
                            {
                                "details": {
                                    "data": {
                                        "domain": "tapp.example",
                                        "operation": "start_app",
                                        "content": "sha384:0f1e"
                                    }
                                }
                            },
                            {
                                "details": {
                                    "data": {
                                        "domain": "cryptpilot.alibabacloud.com",
                                        "operation": "open_volume",
                                        "content": "data0"
                                    }
                                }
                            }
                        ]
                    }
                }
            }
        }
    })
}
