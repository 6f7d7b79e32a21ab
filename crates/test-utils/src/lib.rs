//! Fixtures shared by the workspace tests.

pub mod service;
pub mod tokens;

pub use service::{get_random_port, CapturedRequest, StubService};
pub use tokens::{ear_payload, token_for};
