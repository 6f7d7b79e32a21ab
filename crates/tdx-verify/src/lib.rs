//! Client side of TDX remote attestation: load evidence, submit it to an
//! attestation service and interpret the EAR token that comes back.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod client;
pub mod errors;
pub mod request_types;
pub mod token;

pub use client::*;
pub use errors::*;
pub use request_types::*;
pub use token::*;
