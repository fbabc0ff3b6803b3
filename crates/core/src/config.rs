use alloy::primitives::Address;
use serde::Deserialize;

/// Whether (and how) a token supports EIP-2612 permits.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PermitSupport {
    /// Permit-domain version string. Defaults to
    /// [`crate::permit::DEFAULT_PERMIT_VERSION`] when omitted.
    pub version: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TokenConfig {
    pub address: Address,
    /// Present iff the token supports permit.
    pub permit: Option<PermitSupport>,
}

/// Static deployment addresses for one network. Supplied as configuration;
/// never fetched.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub chain_id: u64,
    pub token: TokenConfig,
    pub factory: Address,
    pub registry: Address,
    pub fee_manager: Address,
}
