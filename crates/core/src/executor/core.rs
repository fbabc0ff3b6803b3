use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tracing::{debug, error};

use crate::{
    classify::{ClassifiedError, MSG_GENERIC_REVERT, RawFailure, classify},
    error::LedgerError,
    ledger::{CallRequest, Ledger},
};

use super::{
    events::{LifecycleEvent, Notifier},
    run::{ActionMeta, RunError, TransactionRun, TransactionState},
};

/// Which cached reads a successful run makes stale. The executor only
/// exposes this; invalidation itself belongs to the caller's query cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationKey {
    pub account: Address,
    pub action: &'static str,
}

/// Drives one ledger-mutating call from submission through finality.
///
/// One executor instance is owned per logical session and passed to every
/// flow that needs to observe or drive it; runs on it are sequential.
pub struct TransactionExecutor {
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    run: TransactionRun,
}

impl TransactionExecutor {
    pub fn new(ledger: Arc<dyn Ledger>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger,
            notifier,
            run: TransactionRun::default(),
        }
    }

    pub fn run(&self) -> &TransactionRun {
        &self.run
    }

    /// After a successful run, the key the caller should refetch under.
    pub fn invalidation_key(&self) -> Option<InvalidationKey> {
        (self.run.state() == TransactionState::Success).then(|| InvalidationKey {
            account: self.ledger.owner(),
            action: self.run.action(),
        })
    }

    /// Submit `call`, wait for finality, and diagnose failure as precisely
    /// as possible. The chain id is injected by the ledger at submission; the
    /// exact call is retained here so a mined-but-failed outcome can be
    /// re-executed in simulation mode.
    pub async fn execute(
        &mut self,
        call: CallRequest,
        meta: ActionMeta,
    ) -> Result<TxHash, RunError> {
        self.run.begin(&meta);
        self.notifier.notify(LifecycleEvent::Pending {
            action: meta.action.to_owned(),
            label: meta.label.clone(),
        });

        let hash = match self.ledger.submit(&call).await {
            Ok(hash) => hash,
            Err(err) => return Err(self.terminate(&err, None)),
        };

        self.run.submitted(hash);
        self.notifier.notify(LifecycleEvent::Confirming {
            action: meta.action.to_owned(),
            hash,
        });

        let receipt = match self.ledger.wait_for_receipt(hash).await {
            Ok(receipt) => receipt,
            Err(err) => return Err(self.terminate(&err, Some(hash))),
        };

        self.run.mined(receipt.clone());

        if receipt.is_success() {
            self.run.succeed();
            self.notifier.notify(LifecycleEvent::Success {
                action: meta.action.to_owned(),
                hash,
            });
            return Ok(hash);
        }

        // Mined but failed: re-execute the recorded call without submitting,
        // to recover a decodable revert from the ledger.
        debug!(tx = %hash, "transaction reverted on chain, re-simulating");
        let classified = match self.ledger.simulate(&call).await {
            Err(sim_err) => {
                let classified = classify(&RawFailure::from(&sim_err));
                if classified.is_contract_revert {
                    classified
                } else {
                    generic_reverted()
                }
            }
            // The simulation no longer fails (state moved on); nothing
            // decodable to report.
            Ok(_) => generic_reverted(),
        };

        let run_error = RunError {
            classified,
            action: self.run.action(),
            tx_hash: Some(hash),
            receipt: Some(receipt),
        };
        self.emit_error(&run_error.classified);
        self.run.fail(run_error.clone());
        Err(run_error)
    }

    fn terminate(&mut self, err: &LedgerError, hash: Option<TxHash>) -> RunError {
        error!(error = %err, action = self.run.action(), "transaction run failed");
        let classified = classify(&RawFailure::from(err));
        let run_error = RunError {
            classified,
            action: self.run.action(),
            tx_hash: hash,
            receipt: None,
        };
        self.emit_error(&run_error.classified);
        self.run.fail(run_error.clone());
        run_error
    }

    fn emit_error(&self, classified: &ClassifiedError) {
        if classified.is_user_rejection {
            // Nothing to report: clear the pending notification silently.
            self.notifier.dismiss(self.run.action());
        } else {
            self.notifier.notify(LifecycleEvent::Error {
                action: self.run.action().to_owned(),
                title: format!("{} failed", self.run.label()),
                message: classified.message.clone(),
            });
        }
    }
}

fn generic_reverted() -> ClassifiedError {
    classify(&RawFailure::from_message(format!(
        "transaction reverted: {MSG_GENERIC_REVERT}"
    )))
}
