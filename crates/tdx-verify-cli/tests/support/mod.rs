#![allow(dead_code)]

use serde_json::Value;
use std::path::Path;
use tdx_verify_cli::config::{HOST_ENV, PORT_ENV};
use tdx_verify_cli::VerifierConfig;

/// Configuration pointing at `port` on loopback, run inside `dir`.
pub fn config_for(
    port: u16,
    dir: &Path,
    verbose: bool,
    extra: &[(&str, &str)],
) -> VerifierConfig {
    let port = port.to_string();
    VerifierConfig::from_lookup(verbose, |name| {
        if name == HOST_ENV {
            return Some("127.0.0.1".to_string());
        }
        if name == PORT_ENV {
            return Some(port.clone());
        }
        extra
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    })
    .unwrap()
    .with_work_dir(dir)
}

pub fn write_evidence(dir: &Path, contents: &Value) {
    std::fs::write(dir.join("evidence.json"), contents.to_string()).unwrap();
}
