//! Status vocabulary, derivation, and disclosure rules.
//!
//! Two deliberately distinct enums: `OutcomeStatus` is the academic result
//! assigned at upload time; `VerificationStatus` is the tri-state that gates
//! what the public query path discloses. Legacy records reused the
//! Valid/Pending/Invalid literals inside the outcome field; that overlap is
//! normalized in exactly one place (`effective_status`), never by callers.

use serde::{Deserialize, Serialize};

/// The academic result category assigned at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Passed,
    Failed,
    #[serde(rename = "Passed Under Condition")]
    PassedUnderCondition,
    #[serde(rename = "Summer School")]
    SummerSchool,
}

impl OutcomeStatus {
    /// Parse the wire name. Returns `None` for anything outside the enum,
    /// including the legacy Valid/Pending/Invalid literals.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Passed" => Some(OutcomeStatus::Passed),
            "Failed" => Some(OutcomeStatus::Failed),
            "Passed Under Condition" => Some(OutcomeStatus::PassedUnderCondition),
            "Summer School" => Some(OutcomeStatus::SummerSchool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "Passed",
            OutcomeStatus::Failed => "Failed",
            OutcomeStatus::PassedUnderCondition => "Passed Under Condition",
            OutcomeStatus::SummerSchool => "Summer School",
        }
    }
}

/// The derived/administrative tri-state controlling public disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Valid,
    Pending,
    Invalid,
}

impl VerificationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Valid" => Some(VerificationStatus::Valid),
            "Pending" => Some(VerificationStatus::Pending),
            "Invalid" => Some(VerificationStatus::Invalid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid => "Valid",
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Invalid => "Invalid",
        }
    }
}

/// Derive the verification status from a submitted outcome.
///
/// "Valid" means the record is real and favorable enough to be attested,
/// not merely that it exists:
///
/// - Passed, Passed Under Condition -> Valid
/// - Failed, Summer School -> Invalid
/// - anything unrecognized -> Pending
pub fn derive_verification_status(outcome: &str) -> VerificationStatus {
    match OutcomeStatus::parse(outcome) {
        Some(OutcomeStatus::Passed) | Some(OutcomeStatus::PassedUnderCondition) => {
            VerificationStatus::Valid
        }
        Some(OutcomeStatus::Failed) | Some(OutcomeStatus::SummerSchool) => {
            VerificationStatus::Invalid
        }
        None => VerificationStatus::Pending,
    }
}

/// Resolve a record's effective verification status.
///
/// The explicit `verificationStatus` field wins when present and parseable.
/// Older records lack that field and sometimes carried the tri-state
/// literals directly in the outcome field; those fall through to the legacy
/// interpretation. Everything else is Pending.
pub fn effective_status(
    verification_status: Option<&str>,
    legacy_status: &str,
) -> VerificationStatus {
    if let Some(parsed) = verification_status.and_then(VerificationStatus::parse) {
        return parsed;
    }
    VerificationStatus::parse(legacy_status).unwrap_or(VerificationStatus::Pending)
}

/// The redacted subset of record fields disclosed for a Valid lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicView {
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub class: String,
    /// The outcome status string as stored (e.g. "Passed").
    pub status: String,
    pub year: Option<i32>,
}

/// Apply the minimum-disclosure rule: only a Valid record yields a payload.
///
/// A Pending or Invalid lookup must not leak any identifying information,
/// even to someone who already holds the token.
pub fn redact(status: VerificationStatus, view: PublicView) -> Option<PublicView> {
    match status {
        VerificationStatus::Valid => Some(view),
        VerificationStatus::Pending | VerificationStatus::Invalid => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_table() {
        assert_eq!(
            derive_verification_status("Passed"),
            VerificationStatus::Valid
        );
        assert_eq!(
            derive_verification_status("Passed Under Condition"),
            VerificationStatus::Valid
        );
        assert_eq!(
            derive_verification_status("Failed"),
            VerificationStatus::Invalid
        );
        assert_eq!(
            derive_verification_status("Summer School"),
            VerificationStatus::Invalid
        );
    }

    #[test]
    fn test_derivation_unknown_is_pending() {
        assert_eq!(derive_verification_status(""), VerificationStatus::Pending);
        assert_eq!(
            derive_verification_status("passed"),
            VerificationStatus::Pending
        );
        assert_eq!(
            derive_verification_status("Graduated"),
            VerificationStatus::Pending
        );
        // The legacy literals are not outcome values either.
        assert_eq!(
            derive_verification_status("Valid"),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn test_derivation_is_total_over_enum() {
        for outcome in [
            OutcomeStatus::Passed,
            OutcomeStatus::Failed,
            OutcomeStatus::PassedUnderCondition,
            OutcomeStatus::SummerSchool,
        ] {
            // Every member maps to exactly one tri-state value.
            let derived = derive_verification_status(outcome.as_str());
            assert!(matches!(
                derived,
                VerificationStatus::Valid | VerificationStatus::Pending | VerificationStatus::Invalid
            ));
        }
    }

    #[test]
    fn test_effective_status_explicit_wins() {
        assert_eq!(
            effective_status(Some("Invalid"), "Passed"),
            VerificationStatus::Invalid
        );
        assert_eq!(
            effective_status(Some("Valid"), "Failed"),
            VerificationStatus::Valid
        );
    }

    #[test]
    fn test_effective_status_legacy_fallback() {
        assert_eq!(
            effective_status(None, "Pending"),
            VerificationStatus::Pending
        );
        assert_eq!(effective_status(None, "Valid"), VerificationStatus::Valid);
        assert_eq!(
            effective_status(None, "Invalid"),
            VerificationStatus::Invalid
        );
        // Outcome vocabulary in the legacy field does not leak through.
        assert_eq!(effective_status(None, "Passed"), VerificationStatus::Pending);
        // Unparseable explicit value falls back too.
        assert_eq!(
            effective_status(Some("valid"), "Invalid"),
            VerificationStatus::Invalid
        );
    }

    #[test]
    fn test_redact_gates_on_valid() {
        let view = PublicView {
            student_name: "Alice Johnson".to_string(),
            class: "10th Grade".to_string(),
            status: "Passed".to_string(),
            year: Some(2023),
        };
        assert_eq!(
            redact(VerificationStatus::Valid, view.clone()),
            Some(view.clone())
        );
        assert_eq!(redact(VerificationStatus::Pending, view.clone()), None);
        assert_eq!(redact(VerificationStatus::Invalid, view), None);
    }

    #[test]
    fn test_outcome_wire_names_round_trip() {
        for s in ["Passed", "Failed", "Passed Under Condition", "Summer School"] {
            let parsed = OutcomeStatus::parse(s).unwrap();
            assert_eq!(parsed.as_str(), s);
            let json = serde_json::to_value(parsed).unwrap();
            assert_eq!(json, serde_json::json!(s));
        }
    }
}
