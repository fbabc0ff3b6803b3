//! Static, per-contract table of human-readable revert messages, plus the
//! revert-payload decoder that feeds it.

use alloy::sol_types::SolInterface;
use ward_abi::{
    IAgentRegistry::IAgentRegistryErrors, IEscrow::IEscrowErrors,
    IEscrowFactory::IEscrowFactoryErrors, IFeeManager::IFeeManagerErrors,
};

/// A custom error recovered from raw revert data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRevert {
    pub name: &'static str,
    /// Decoded argument rendering, for the errors whose signature carries
    /// diagnostic values.
    pub detail: Option<String>,
}

/// Look up the display message for a known custom error name.
pub fn revert_message(name: &str) -> Option<&'static str> {
    let message = match name {
        // Escrow lifecycle
        "Escrow__NotParty" => "Only the escrow client or agent can do this.",
        "Escrow__InvalidState" => "The escrow is not in a state that allows this action.",
        "Escrow__AlreadyFunded" => "This escrow has already been funded.",
        "Escrow__NotFunded" => "This escrow has not been funded yet.",
        "Escrow__DeadlineNotReached" => "The escrow deadline has not been reached yet.",
        "Escrow__DisputeAlreadyRaised" => "A dispute has already been raised for this escrow.",
        "Escrow__AmountMismatch" => "The amount sent does not match the escrow amount.",
        "Escrow__TransferFailed" => "The token transfer failed.",

        // Factory
        "Factory__TitleTooLong" => "The escrow title is too long.",
        "Factory__DescriptionTooLong" => "The escrow description is too long.",
        "Factory__InvalidParameters" => "The escrow parameters are invalid.",
        "Factory__ZeroAmount" => "The escrow amount must be greater than zero.",
        "Factory__TokenNotAllowed" => "This token is not supported by the protocol.",
        "Factory__DeadlineInPast" => "The escrow deadline must be in the future.",

        // Agent registry
        "Registry__AgentAlreadyRegistered" => "This account is already registered as an agent.",
        "Registry__AgentNotRegistered" => "This account is not registered as an agent.",
        "Registry__InsufficientStake" => "Your stake is too low for this action.",
        "Registry__StakeLocked" => "Your stake is locked and cannot be withdrawn yet.",
        "Registry__StakeBelowMinimum" => "The stake amount is below the protocol minimum.",
        "Registry__ProfileUriEmpty" => "An agent profile URI is required.",
        "Registry__AgentSuspended" => "This agent account is suspended.",

        // Fee manager
        "Fees__FeeTooHigh" => "The requested fee exceeds the protocol maximum.",
        "Fees__NotFeeCollector" => "Only the fee collector can do this.",
        "Fees__ZeroAddress" => "The zero address is not a valid recipient.",
        "Fees__NothingToWithdraw" => "There are no fees to withdraw.",

        _ => return None,
    };
    Some(message)
}

/// Try to decode a raw revert payload against every contract error set the
/// client knows about.
pub fn decode_revert_data(data: &[u8]) -> Option<DecodedRevert> {
    if let Ok(err) = IEscrowFactoryErrors::abi_decode(data) {
        return Some(decode_factory(err));
    }
    if let Ok(err) = IEscrowErrors::abi_decode(data) {
        return Some(decode_escrow(err));
    }
    if let Ok(err) = IAgentRegistryErrors::abi_decode(data) {
        return Some(decode_registry(err));
    }
    if let Ok(err) = IFeeManagerErrors::abi_decode(data) {
        return Some(decode_fees(err));
    }
    None
}

fn decode_factory(err: IEscrowFactoryErrors) -> DecodedRevert {
    use IEscrowFactoryErrors::*;
    match err {
        // The two length errors carry (length, maxLength); surface them.
        Factory__TitleTooLong(inner) => DecodedRevert {
            name: "Factory__TitleTooLong",
            detail: Some(format!("(got {}, max {})", inner.length, inner.maxLength)),
        },
        Factory__DescriptionTooLong(inner) => DecodedRevert {
            name: "Factory__DescriptionTooLong",
            detail: Some(format!("(got {}, max {})", inner.length, inner.maxLength)),
        },
        Factory__InvalidParameters(_) => named("Factory__InvalidParameters"),
        Factory__ZeroAmount(_) => named("Factory__ZeroAmount"),
        Factory__TokenNotAllowed(_) => named("Factory__TokenNotAllowed"),
        Factory__DeadlineInPast(_) => named("Factory__DeadlineInPast"),
    }
}

fn decode_escrow(err: IEscrowErrors) -> DecodedRevert {
    use IEscrowErrors::*;
    let name = match err {
        Escrow__NotParty(_) => "Escrow__NotParty",
        Escrow__InvalidState(_) => "Escrow__InvalidState",
        Escrow__AlreadyFunded(_) => "Escrow__AlreadyFunded",
        Escrow__NotFunded(_) => "Escrow__NotFunded",
        Escrow__DeadlineNotReached(_) => "Escrow__DeadlineNotReached",
        Escrow__DisputeAlreadyRaised(_) => "Escrow__DisputeAlreadyRaised",
        Escrow__AmountMismatch(_) => "Escrow__AmountMismatch",
        Escrow__TransferFailed(_) => "Escrow__TransferFailed",
    };
    named(name)
}

fn decode_registry(err: IAgentRegistryErrors) -> DecodedRevert {
    use IAgentRegistryErrors::*;
    let name = match err {
        Registry__AgentAlreadyRegistered(_) => "Registry__AgentAlreadyRegistered",
        Registry__AgentNotRegistered(_) => "Registry__AgentNotRegistered",
        Registry__InsufficientStake(_) => "Registry__InsufficientStake",
        Registry__StakeLocked(_) => "Registry__StakeLocked",
        Registry__StakeBelowMinimum(_) => "Registry__StakeBelowMinimum",
        Registry__ProfileUriEmpty(_) => "Registry__ProfileUriEmpty",
        Registry__AgentSuspended(_) => "Registry__AgentSuspended",
    };
    named(name)
}

fn decode_fees(err: IFeeManagerErrors) -> DecodedRevert {
    use IFeeManagerErrors::*;
    let name = match err {
        Fees__FeeTooHigh(_) => "Fees__FeeTooHigh",
        Fees__NotFeeCollector(_) => "Fees__NotFeeCollector",
        Fees__ZeroAddress(_) => "Fees__ZeroAddress",
        Fees__NothingToWithdraw(_) => "Fees__NothingToWithdraw",
    };
    named(name)
}

fn named(name: &'static str) -> DecodedRevert {
    DecodedRevert { name, detail: None }
}

/// Readable fallback for error names the table does not know.
///
/// `Registry__SomeThing` becomes `"Registry: Some Thing"`.
pub fn de_camel_case(name: &str) -> String {
    match name.split_once("__") {
        Some((group, rest)) => format!("{}: {}", group, space_camel(rest)),
        None => space_camel(name),
    }
}

fn space_camel(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i != 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolError;
    use alloy::primitives::U256;
    use ward_abi::IEscrowFactory;

    use super::*;

    #[test]
    fn known_names_have_messages() {
        assert_eq!(
            revert_message("Registry__InsufficientStake"),
            Some("Your stake is too low for this action.")
        );
        assert!(revert_message("Escrow__NotFunded").is_some());
        assert_eq!(revert_message("Totally__Unknown"), None);
    }

    #[test]
    fn decodes_length_error_with_arguments() {
        let raw = IEscrowFactory::Factory__TitleTooLong {
            length: U256::from(120),
            maxLength: U256::from(64),
        }
        .abi_encode();

        let decoded = decode_revert_data(&raw).expect("should decode");
        assert_eq!(decoded.name, "Factory__TitleTooLong");
        assert_eq!(decoded.detail.as_deref(), Some("(got 120, max 64)"));
    }

    #[test]
    fn decodes_argless_error() {
        let raw = ward_abi::IAgentRegistry::Registry__InsufficientStake {}.abi_encode();
        let decoded = decode_revert_data(&raw).expect("should decode");
        assert_eq!(decoded.name, "Registry__InsufficientStake");
        assert_eq!(decoded.detail, None);
    }

    #[test]
    fn garbage_data_does_not_decode() {
        assert_eq!(decode_revert_data(&[0xde, 0xad, 0xbe, 0xef]), None);
    }

    #[test]
    fn de_camel_cases_unknown_names() {
        assert_eq!(de_camel_case("Group__SomeThing"), "Group: Some Thing");
        assert_eq!(de_camel_case("JustOneWord"), "Just One Word");
    }
}
