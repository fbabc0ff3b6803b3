use alloy::{
    primitives::{Address, Bytes, Signature, TxHash, U256},
    sol_types::Eip712Domain,
};
use async_trait::async_trait;
use ward_abi::Permit;

use crate::error::LedgerError;

/// A prepared ledger-mutating call: recipient, calldata, attached value.
///
/// The chain id is deliberately absent. It is injected at submission time by
/// the [`Ledger`] implementation so a call can never target whatever network
/// the signer was last configured for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl CallRequest {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Finality record for a mined transaction. A reverted receipt is evidence,
/// not garbage: it is retained through the error path so "mined but failed"
/// stays distinguishable from "never reached the ledger".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: u64,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }
}

/// The capabilities the core needs from the outside world: reads, signed
/// submission, receipt waiting, simulation, and EIP-712 signing.
///
/// Everything above this trait is testable against a mock; the alloy-backed
/// implementation lives in [`crate::client`].
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Active network id, injected into every submitted call.
    fn chain_id(&self) -> u64;

    /// The connected account.
    fn owner(&self) -> Address;

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256, LedgerError>;

    async fn permit_nonce(&self, token: Address) -> Result<U256, LedgerError>;

    async fn token_name(&self, token: Address) -> Result<String, LedgerError>;

    /// Submit a mutating call through the connected signer.
    async fn submit(&self, call: &CallRequest) -> Result<TxHash, LedgerError>;

    /// Block until the transaction is mined. There is no client-side timeout;
    /// the ledger may take an unbounded time to finalize.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, LedgerError>;

    /// Re-execute a call without submitting it. A revert surfaces as
    /// [`LedgerError::Reverted`] carrying the raw revert payload.
    async fn simulate(&self, call: &CallRequest) -> Result<Bytes, LedgerError>;

    /// Sign an EIP-2612 permit message over the given domain.
    async fn sign_permit(
        &self,
        domain: &Eip712Domain,
        message: &Permit,
    ) -> Result<Signature, LedgerError>;
}
