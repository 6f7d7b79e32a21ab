//! `verify-evidence`: submits local TDX evidence to an attestation service
//! and reports what the returned token says about the instance.

pub mod artifacts;
pub mod config;
pub mod logging;
pub mod render;
pub mod workflow;

pub use config::{Args, ConfigError, VerifierConfig};
pub use logging::init_tracing;
pub use workflow::{run, RunReport};

use tdx_verify::VerifyError;

/// Everything that can end a run early.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("failed to write report")]
    Output(#[from] std::io::Error),
}
