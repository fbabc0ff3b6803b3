use alloy::primitives::TxHash;

use crate::{classify::ClassifiedError, ledger::Receipt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    /// Dispatched to the wallet; no hash yet.
    Pending,
    /// Hash obtained; waiting for finality.
    Confirming,
    Success,
    Error,
}

/// Identifies the kind of operation a run performs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionMeta {
    /// Stable identifier, e.g. `"registerAgent"`.
    pub action: &'static str,
    /// Human-readable label for display.
    pub label: String,
}

impl ActionMeta {
    pub fn new(action: &'static str, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
        }
    }
}

/// Terminal failure of a run, with everything diagnostics needs attached.
///
/// `tx_hash` and `receipt` are present exactly when the call reached the
/// ledger: a mined-but-reverted run carries both, a pre-submission failure
/// carries neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunError {
    pub classified: ClassifiedError,
    pub action: &'static str,
    pub tx_hash: Option<TxHash>,
    pub receipt: Option<Receipt>,
}

/// Observable state of one transaction invocation.
#[derive(Clone, Debug)]
pub struct TransactionRun {
    action: &'static str,
    label: String,
    state: TransactionState,
    hash: Option<TxHash>,
    receipt: Option<Receipt>,
    last_error: Option<RunError>,
}

impl Default for TransactionRun {
    fn default() -> Self {
        Self {
            action: "",
            label: String::new(),
            state: TransactionState::Idle,
            hash: None,
            receipt: None,
            last_error: None,
        }
    }
}

impl TransactionRun {
    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn hash(&self) -> Option<TxHash> {
        self.hash
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn last_error(&self) -> Option<&RunError> {
        self.last_error.as_ref()
    }

    /// Start a new run. A previous run's hash and receipt are deliberately
    /// kept until this run reaches the same stage, so diagnostics for a
    /// mined failure stay inspectable if the retry dies before submission.
    pub(super) fn begin(&mut self, meta: &ActionMeta) {
        self.action = meta.action;
        self.label = meta.label.clone();
        self.last_error = None;
        self.state = TransactionState::Pending;
    }

    pub(super) fn submitted(&mut self, hash: TxHash) {
        debug_assert_eq!(self.state, TransactionState::Pending);
        self.hash = Some(hash);
        self.state = TransactionState::Confirming;
    }

    pub(super) fn mined(&mut self, receipt: Receipt) {
        debug_assert_eq!(self.state, TransactionState::Confirming);
        self.receipt = Some(receipt);
    }

    pub(super) fn succeed(&mut self) {
        debug_assert_eq!(self.state, TransactionState::Confirming);
        self.state = TransactionState::Success;
    }

    pub(super) fn fail(&mut self, error: RunError) {
        self.last_error = Some(error);
        self.state = TransactionState::Error;
    }
}
