//! Request types for the attestation service

pub mod coco_as;
pub mod evidence;

pub use evidence::{EvidenceRecord, EVIDENCE_FILE_NAME};
