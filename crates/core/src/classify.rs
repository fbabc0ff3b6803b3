//! Error classification: turn an arbitrary failure into a typed diagnosis.
//!
//! Classification runs as an ordered chain of pure predicate + extractor
//! steps over a normalized [`RawFailure`]. It is deterministic, never fails,
//! and is independently testable with literal strings.

use std::sync::LazyLock;

use alloy::primitives::Bytes;
use regex::Regex;

use crate::{
    error::LedgerError,
    messages::{DecodedRevert, de_camel_case, decode_revert_data, revert_message},
};

/// EIP-1193: the user rejected the request in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

pub const MSG_USER_REJECTED: &str = "Request cancelled in the wallet.";
pub const MSG_NETWORK: &str = "Network error. Check your connection and try again.";
pub const MSG_INSUFFICIENT_FUNDS: &str = "Insufficient funds to cover this transaction.";
pub const MSG_GENERIC_REVERT: &str = "The contract rejected this action.";
pub const MSG_GAS_ESTIMATE: &str = "Could not estimate gas for this transaction.";
pub const MSG_UNKNOWN: &str = "An unexpected error occurred.";

/// Normalized form of a failure, built before classification.
///
/// Callers should log the raw error before normalizing: the classified
/// message intentionally drops detail.
#[derive(Clone, Debug, Default)]
pub struct RawFailure {
    pub message: String,
    pub code: Option<i64>,
    pub revert_data: Option<Bytes>,
}

impl RawFailure {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_revert_data(mut self, data: Bytes) -> Self {
        self.revert_data = Some(data);
        self
    }
}

impl From<&LedgerError> for RawFailure {
    fn from(err: &LedgerError) -> Self {
        Self {
            message: err.to_string(),
            code: err.rpc_code(),
            revert_data: err.revert_data(),
        }
    }
}

/// The diagnosis. At most one of the three flags is meaningfully true;
/// `contract_error_name` may accompany `is_contract_revert`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedError {
    pub message: String,
    pub is_user_rejection: bool,
    pub is_network_error: bool,
    pub is_contract_revert: bool,
    pub contract_error_name: Option<String>,
    pub code: Option<i64>,
}

impl ClassifiedError {
    fn unknown(code: Option<i64>) -> Self {
        Self {
            message: MSG_UNKNOWN.to_owned(),
            is_user_rejection: false,
            is_network_error: false,
            is_contract_revert: false,
            contract_error_name: None,
            code,
        }
    }

    fn user_rejection(code: Option<i64>) -> Self {
        Self {
            message: MSG_USER_REJECTED.to_owned(),
            is_user_rejection: true,
            ..Self::unknown(code)
        }
    }

    fn network(code: Option<i64>) -> Self {
        Self {
            message: MSG_NETWORK.to_owned(),
            is_network_error: true,
            ..Self::unknown(code)
        }
    }

    fn revert(message: String, name: Option<String>, code: Option<i64>) -> Self {
        Self {
            message,
            is_contract_revert: true,
            contract_error_name: name,
            ..Self::unknown(code)
        }
    }
}

const REJECTION_PHRASES: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected the request",
    "action_rejected",
    "request rejected",
];

const NETWORK_PHRASES: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "failed to fetch",
    "network error",
    "getaddrinfo",
    "dns error",
    "could not detect network",
];

static ERROR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9]*__[A-Za-z0-9]+)\b").unwrap());

static REVERT_REASON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"reason="([^"]+)""#).unwrap());

/// Classify a failure. Never panics, never errors: the worst case is the
/// generic unknown diagnosis.
pub fn classify(raw: &RawFailure) -> ClassifiedError {
    let lower = raw.message.to_lowercase();

    if is_user_rejection(&lower, raw.code) {
        return ClassifiedError::user_rejection(raw.code);
    }

    if NETWORK_PHRASES.iter().any(|p| lower.contains(p)) {
        return ClassifiedError::network(raw.code);
    }

    if lower.contains("insufficient funds") {
        return ClassifiedError::revert(MSG_INSUFFICIENT_FUNDS.to_owned(), None, raw.code);
    }

    if let Some(decoded) = extract_custom_error(raw) {
        let base = revert_message(decoded.name)
            .map(str::to_owned)
            .unwrap_or_else(|| de_camel_case(decoded.name));
        let message = match decoded.detail {
            Some(detail) => format!("{base} {detail}"),
            None => base,
        };
        return ClassifiedError::revert(message, Some(decoded.name.to_owned()), raw.code);
    }

    // Custom error name in message form only; the table may still know it.
    if let Some(name) = ERROR_NAME_RE
        .captures(&raw.message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
    {
        let message = revert_message(&name)
            .map(str::to_owned)
            .unwrap_or_else(|| de_camel_case(&name));
        return ClassifiedError::revert(message, Some(name), raw.code);
    }

    if lower.contains("revert") {
        let message = REVERT_REASON_RE
            .captures(&raw.message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
            .unwrap_or_else(|| MSG_GENERIC_REVERT.to_owned());
        return ClassifiedError::revert(message, None, raw.code);
    }

    if lower.contains("gas") && lower.contains("estimate") {
        let mut classified = ClassifiedError::unknown(raw.code);
        classified.message = MSG_GAS_ESTIMATE.to_owned();
        return classified;
    }

    ClassifiedError::unknown(raw.code)
}

fn is_user_rejection(lower: &str, code: Option<i64>) -> bool {
    code == Some(USER_REJECTED_CODE) || REJECTION_PHRASES.iter().any(|p| lower.contains(p))
}

fn extract_custom_error(raw: &RawFailure) -> Option<DecodedRevert> {
    raw.revert_data
        .as_ref()
        .and_then(|data| decode_revert_data(data))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use alloy::sol_types::SolError;

    use super::*;

    fn flags(c: &ClassifiedError) -> (bool, bool, bool) {
        (c.is_user_rejection, c.is_network_error, c.is_contract_revert)
    }

    #[test]
    fn classifies_rejection_phrases() {
        for message in [
            "MetaMask Tx Signature: User denied transaction signature.",
            "user rejected the request",
            "ACTION_REJECTED: user cancelled",
        ] {
            let c = classify(&RawFailure::from_message(message));
            assert_eq!(flags(&c), (true, false, false), "{message}");
            assert_eq!(c.message, MSG_USER_REJECTED);
        }
    }

    #[test]
    fn classifies_rejection_code() {
        let c = classify(&RawFailure::from_message("denied").with_code(4001));
        assert!(c.is_user_rejection);
        assert_eq!(c.code, Some(4001));
    }

    #[test]
    fn classifies_network_errors() {
        for message in [
            "request timed out after 30s",
            "error: connection refused",
            "TypeError: Failed to fetch",
        ] {
            let c = classify(&RawFailure::from_message(message));
            assert_eq!(flags(&c), (false, true, false), "{message}");
        }
    }

    #[test]
    fn classifies_insufficient_funds() {
        let c = classify(&RawFailure::from_message(
            "insufficient funds for gas * price + value",
        ));
        assert!(c.is_contract_revert);
        assert_eq!(c.message, MSG_INSUFFICIENT_FUNDS);
    }

    #[test]
    fn decodes_known_error_from_revert_data() {
        let data = ward_abi::IAgentRegistry::Registry__InsufficientStake {}.abi_encode();
        let c = classify(
            &RawFailure::from_message("call reverted: execution reverted")
                .with_revert_data(data.into()),
        );
        assert!(c.is_contract_revert);
        assert_eq!(
            c.contract_error_name.as_deref(),
            Some("Registry__InsufficientStake")
        );
        assert_eq!(c.message, "Your stake is too low for this action.");
    }

    #[test]
    fn appends_decoded_length_arguments() {
        let data = ward_abi::IEscrowFactory::Factory__DescriptionTooLong {
            length: U256::from(600),
            maxLength: U256::from(500),
        }
        .abi_encode();
        let c = classify(&RawFailure::from_message("reverted").with_revert_data(data.into()));
        assert_eq!(
            c.contract_error_name.as_deref(),
            Some("Factory__DescriptionTooLong")
        );
        assert_eq!(
            c.message,
            "The escrow description is too long. (got 600, max 500)"
        );
    }

    #[test]
    fn extracts_known_error_name_from_message() {
        let c = classify(&RawFailure::from_message(
            "execution reverted with custom error Escrow__AlreadyFunded()",
        ));
        assert!(c.is_contract_revert);
        assert_eq!(c.contract_error_name.as_deref(), Some("Escrow__AlreadyFunded"));
        assert_eq!(c.message, "This escrow has already been funded.");
    }

    #[test]
    fn de_camel_cases_unknown_error_name() {
        let c = classify(&RawFailure::from_message(
            "execution reverted: Group__SomeThing()",
        ));
        assert!(c.is_contract_revert);
        assert_eq!(c.contract_error_name.as_deref(), Some("Group__SomeThing"));
        assert!(c.message.contains("Group"));
        assert!(c.message.contains("Some Thing"));
    }

    #[test]
    fn extracts_revert_reason_fragment() {
        let c = classify(&RawFailure::from_message(
            r#"execution reverted, reason="stake too small""#,
        ));
        assert!(c.is_contract_revert);
        assert_eq!(c.message, "stake too small");
    }

    #[test]
    fn generic_revert_without_reason() {
        let c = classify(&RawFailure::from_message("execution reverted"));
        assert!(c.is_contract_revert);
        assert_eq!(c.message, MSG_GENERIC_REVERT);
    }

    #[test]
    fn classifies_gas_estimation_failure() {
        let c = classify(&RawFailure::from_message(
            "cannot estimate gas; transaction may fail",
        ));
        assert_eq!(flags(&c), (false, false, false));
        assert_eq!(c.message, MSG_GAS_ESTIMATE);
    }

    #[test]
    fn falls_back_to_unknown() {
        let c = classify(&RawFailure::from_message("something odd happened"));
        assert_eq!(flags(&c), (false, false, false));
        assert_eq!(c.message, MSG_UNKNOWN);
    }

    #[test]
    fn rejection_wins_over_revert_phrasing() {
        let c = classify(&RawFailure::from_message(
            "user rejected: execution reverted",
        ));
        assert!(c.is_user_rejection);
        assert!(!c.is_contract_revert);
    }
}
