use alloy::{
    contract,
    primitives::Bytes,
    providers::{MulticallError, PendingTransactionError},
    transports::TransportError,
};
use thiserror::Error;

/// Failures raised by the ledger capability layer before classification.
///
/// These are plumbing errors. User-facing flows never see them directly:
/// the approval manager and the transaction executor normalize them into a
/// [`crate::classify::ClassifiedError`] at the boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("contract call failed: {0}")]
    Contract(#[from] contract::Error),

    #[error("multicall failed: {0}")]
    Multicall(#[from] MulticallError),

    #[error("pending transaction error: {0}")]
    Pending(#[from] PendingTransactionError),

    #[error("signing failed: {0}")]
    Signer(#[from] alloy::signers::Error),

    /// A simulation or call reverted. `data` holds the raw revert payload
    /// when the node returned one, so the classifier can decode a custom
    /// error name out of it.
    #[error("call reverted: {message}")]
    Reverted {
        message: String,
        data: Option<Bytes>,
    },
}

impl LedgerError {
    /// Revert payload attached to this error, if any.
    pub fn revert_data(&self) -> Option<Bytes> {
        match self {
            Self::Reverted { data, .. } => data.clone(),
            Self::Contract(err) => err.as_revert_data(),
            Self::Transport(err) => err
                .as_error_resp()
                .and_then(|payload| payload.as_revert_data()),
            _ => None,
        }
    }

    /// JSON-RPC error code, when the failure came back as an error response.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Transport(err) => err.as_error_resp().map(|payload| payload.code),
            _ => None,
        }
    }
}
