use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tdx_verify::coco_as::{IdentityContext, DEFAULT_POLICY_ID};
use tdx_verify::{
    AttestationClient, VerifyError, ATTESTATION_DEFAULT_HOST, ATTESTATION_DEFAULT_PORT,
    ATTESTATION_DEFAULT_TIMEOUT_SECONDS,
};

pub const POLICY_ID_ENV: &str = "POLICY_ID";
pub const IMAGE_ID_ENV: &str = "IMAGE_ID";
pub const INSTANCE_ID_ENV: &str = "INSTANCE_ID";
pub const INSTANCE_NAME_ENV: &str = "INSTANCE_NAME";
pub const OWNER_ACCOUNT_ID_ENV: &str = "OWNER_ACCOUNT_ID";
pub const URL_ENV: &str = "ATTESTATION_URL";
pub const HOST_ENV: &str = "ATTESTATION_HOST";
pub const PORT_ENV: &str = "ATTESTATION_PORT";
pub const TIMEOUT_ENV: &str = "ATTESTATION_TIMEOUT_SECS";
pub const INSECURE_SKIP_VERIFY_ENV: &str = "ATTESTATION_INSECURE_SKIP_VERIFY";

const AFTER_HELP: &str = "\
Examples:
  # basic usage (only show key information)
  verify-evidence

  # detailed mode (show full JWT header and payload)
  verify-evidence -v
  verify-evidence --verbose

Environment:
  POLICY_ID, IMAGE_ID, INSTANCE_ID, INSTANCE_NAME, OWNER_ACCOUNT_ID,
  ATTESTATION_URL, ATTESTATION_HOST, ATTESTATION_PORT, ATTESTATION_TIMEOUT_SECS,
  ATTESTATION_INSECURE_SKIP_VERIFY, RUST_LOG";

/// Verify TDX evidence and decode the returned JWT token
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Args {
    /// Show full JWT header and payload, and cryptpilot logs
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: expected {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Settings for one verification run, read from the environment.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Full endpoint URL. Replaces `host` and `port` when set.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub policy_id: String,
    pub identity: IdentityContext,
    /// `None` waits on the service indefinitely.
    pub timeout: Option<Duration>,
    /// Skips TLS certificate checks on an `https` [`url`](Self::url). On by
    /// default so the tool keeps working against a gateway with a
    /// self-signed certificate; set `ATTESTATION_INSECURE_SKIP_VERIFY=false`
    /// wherever the path to the service is not trusted.
    pub insecure_skip_verify: bool,
    /// Directory holding the evidence file and receiving the artifacts.
    /// Empty means the current directory.
    pub work_dir: PathBuf,
    pub verbose: bool,
}

impl VerifierConfig {
    pub fn from_env(verbose: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(verbose, |var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(verbose: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // unset and empty variables are treated the same way
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let port = match var(PORT_ENV) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                value,
                expected: "a port number",
            })?,
            None => ATTESTATION_DEFAULT_PORT,
        };

        let timeout = match var(TIMEOUT_ENV) {
            Some(value) => match value.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: TIMEOUT_ENV,
                        value,
                        expected: "a number of seconds",
                    })
                }
            },
            None => Some(Duration::from_secs(ATTESTATION_DEFAULT_TIMEOUT_SECONDS)),
        };

        let insecure_skip_verify = match var(INSECURE_SKIP_VERIFY_ENV) {
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                var: INSECURE_SKIP_VERIFY_ENV,
                value,
                expected: "true or false",
            })?,
            None => true,
        };

        let identity = IdentityContext::default()
            .with_image_id(var(IMAGE_ID_ENV).unwrap_or_default())
            .with_instance_id(var(INSTANCE_ID_ENV).unwrap_or_default())
            .with_instance_name(var(INSTANCE_NAME_ENV).unwrap_or_default())
            .with_owner_account_id(var(OWNER_ACCOUNT_ID_ENV).unwrap_or_default());

        Ok(Self {
            url: var(URL_ENV),
            host: var(HOST_ENV).unwrap_or_else(|| ATTESTATION_DEFAULT_HOST.to_string()),
            port,
            policy_id: var(POLICY_ID_ENV).unwrap_or_else(|| DEFAULT_POLICY_ID.to_string()),
            identity,
            timeout,
            insecure_skip_verify,
            work_dir: PathBuf::new(),
            verbose,
        })
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn client(&self) -> Result<AttestationClient, VerifyError> {
        let builder = AttestationClient::builder()
            .addr(self.host.clone())
            .port(self.port)
            .insecure_skip_verify(self.insecure_skip_verify);
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder.no_timeout(),
        };
        let builder = match &self.url {
            Some(url) => builder.url(url.clone()),
            None => builder,
        };
        builder.build()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
