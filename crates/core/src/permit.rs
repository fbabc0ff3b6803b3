//! EIP-2612 permit grants and domain construction.

use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::{
    primitives::{Address, B256, Signature, U256},
    sol_types::Eip712Domain,
};

/// How long a signed permit stays valid.
pub const PERMIT_DEADLINE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Fallback when a token's configuration omits a permit-domain version.
/// Asserted, not derived from the token contract; a mismatch produces a
/// signature the ledger silently rejects, so configs should set it.
pub const DEFAULT_PERMIT_VERSION: &str = "1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermitSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub deadline: U256,
}

impl PermitSignature {
    pub fn from_signature(signature: &Signature, deadline: U256) -> Self {
        Self {
            v: 27 + signature.v() as u8,
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
            deadline,
        }
    }
}

/// An off-ledger authorization for a spend of exactly `value`.
///
/// The signature is cryptographically bound to `value`; a grant must never be
/// applied to any other requested amount, larger or smaller. Token, spender,
/// or network changes invalidate it outright.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermitGrant {
    pub signature: PermitSignature,
    pub value: U256,
}

impl PermitGrant {
    /// A grant satisfies a request only on exact equality.
    pub fn covers(&self, amount: U256) -> bool {
        self.value == amount
    }
}

/// Build the EIP-712 domain for a token's permit.
///
/// The four inputs must reproduce the token's own domain bit-for-bit; an
/// incorrect domain yields an unusable signature with no error until the
/// ledger rejects the eventual permit call.
pub fn permit_domain(name: &str, version: &str, chain_id: u64, token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Owned(name.to_owned())),
        Some(Cow::Owned(version.to_owned())),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

/// Deadline for a permit signed now.
pub fn permit_deadline(now: SystemTime) -> U256 {
    let now_secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    U256::from(now_secs + PERMIT_DEADLINE_WINDOW.as_secs())
}
