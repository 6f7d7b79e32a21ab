//! Trust signals extracted from an EAR token payload.
//!
//! Every item is looked up on its own. A payload that lacks one of them
//! still yields the others, with the gap recorded as a [`MissingField`].

use serde_json::{Map, Value};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

use super::path::{lookup, lookup_array, lookup_object, MissingField};

// `cpu0` is the appraisal of the TDX evidence inside the EAR `submods` map
const STATUS: [&str; 3] = ["submods", "cpu0", "ear.status"];
const TRUST_VECTOR: [&str; 3] = ["submods", "cpu0", "ear.trustworthiness-vector"];
const REPORT_DATA: [&str; 7] = [
    "submods",
    "cpu0",
    "ear.veraison.annotated-evidence",
    "tdx",
    "quote",
    "body",
    "report_data",
];
const UEFI_EVENT_LOGS: [&str; 5] = [
    "submods",
    "cpu0",
    "ear.veraison.annotated-evidence",
    "tdx",
    "uefi_event_logs",
];

/// `operation` recorded by the measured boot agent when an application starts.
pub const START_APP_OPERATION: &str = "start_app";

/// Log namespace of the cryptpilot disk encryption service.
pub const CRYPTPILOT_DOMAIN: &str = "cryptpilot.alibabacloud.com";

/// Human-facing digest of an attestation result.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationSummary {
    /// `ear.status`, the overall appraisal.
    pub status: Result<Value, MissingField>,
    pub trust_vector: Result<TrustVector, MissingField>,
    /// The quote's `report_data`, as encoded by the service.
    pub report_data: Result<Value, MissingField>,
    /// `details` of every UEFI event log entry that started an application.
    pub start_app: Result<Vec<Value>, MissingField>,
    /// Entries logged under [`CRYPTPILOT_DOMAIN`].
    pub cryptpilot: Result<Vec<CryptpilotEntry>, MissingField>,
}

impl AttestationSummary {
    pub fn from_payload(payload: &Value) -> Self {
        let logs = lookup_array(payload, &UEFI_EVENT_LOGS);

        Self {
            status: lookup(payload, &STATUS).into_result().cloned(),
            trust_vector: lookup_object(payload, &TRUST_VECTOR).map(TrustVector::from_map),
            report_data: lookup(payload, &REPORT_DATA).into_result().cloned(),
            start_app: logs.clone().map(|logs| start_app_entries(logs)),
            cryptpilot: logs.map(|logs| cryptpilot_entries(logs)),
        }
    }

    /// Every item that could not be extracted.
    pub fn missing_fields(&self) -> Vec<&MissingField> {
        [
            self.status.as_ref().err(),
            self.trust_vector.as_ref().err(),
            self.report_data.as_ref().err(),
            self.start_app.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// The trust dimensions shown to the user. Other dimensions are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustVector {
    pub configuration: Option<Value>,
    pub executables: Option<Value>,
    pub file_system: Option<Value>,
}

impl TrustVector {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            configuration: map.get("configuration").cloned(),
            executables: map.get("executables").cloned(),
            file_system: map.get("file-system").cloned(),
        }
    }

    /// Dimensions with their claim names, in display order.
    pub fn dimensions(&self) -> [(&'static str, Option<&Value>); 3] {
        [
            ("configuration", self.configuration.as_ref()),
            ("executables", self.executables.as_ref()),
            ("file-system", self.file_system.as_ref()),
        ]
    }
}

/// AR4SI trustworthiness tier of a claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TrustTier {
    #[strum(serialize = "none")]
    NoClaim,
    Affirming,
    Warning,
    Contraindicated,
}

impl TrustTier {
    /// Classifies a claim given either as an AR4SI code or a tier name.
    ///
    /// Codes outside the ranges defined by AR4SI yield `None`.
    pub fn from_claim(claim: &Value) -> Option<Self> {
        match claim {
            Value::Number(number) => number.as_i64().and_then(Self::from_code),
            Value::String(name) => Self::from_str(name).ok(),
            _ => None,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -1..=1 => Some(Self::NoClaim),
            2..=31 => Some(Self::Affirming),
            32..=95 => Some(Self::Warning),
            96..=127 => Some(Self::Contraindicated),
            _ => None,
        }
    }
}

/// One cryptpilot log entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptpilotEntry {
    pub operation: Option<Value>,
    pub content: Option<Value>,
}

fn log_data(entry: &Value) -> Option<&Map<String, Value>> {
    entry.get("details")?.get("data")?.as_object()
}

/// `details` of the entries whose data records an application start.
pub fn start_app_entries(logs: &[Value]) -> Vec<Value> {
    logs.iter()
        .filter(|entry| {
            log_data(entry)
                .and_then(|data| data.get("operation"))
                .and_then(Value::as_str)
                == Some(START_APP_OPERATION)
        })
        .filter_map(|entry| entry.get("details").cloned())
        .collect()
}

/// Entries whose data belongs to the cryptpilot domain.
pub fn cryptpilot_entries(logs: &[Value]) -> Vec<CryptpilotEntry> {
    logs.iter()
        .filter_map(log_data)
        .filter(|data| data.get("domain").and_then(Value::as_str) == Some(CRYPTPILOT_DOMAIN))
        .map(|data| CryptpilotEntry {
            operation: data.get("operation").cloned(),
            content: data.get("content").cloned(),
        })
        .collect()
}
