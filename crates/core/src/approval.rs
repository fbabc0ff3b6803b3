//! Per (token, spender) approval unit: converge to "spender may move at
//! least `amount`" using the cheapest mechanism available.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tracing::{debug, error, warn};
use ward_abi::{IERC20Permit, Permit};

use crate::{
    classify::{ClassifiedError, RawFailure, classify},
    config::PermitSupport,
    error::LedgerError,
    ledger::{CallRequest, Ledger},
    permit::{
        DEFAULT_PERMIT_VERSION, PermitGrant, PermitSignature, permit_deadline, permit_domain,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApprovalStatus {
    Idle,
    Checking,
    NeedsApproval,
    Approving,
    SigningPermit,
    Approved,
    /// Terminal until the caller retries explicitly.
    Error(ClassifiedError),
}

/// Outcome of the shared on-ledger approval: the allowance as re-read after
/// mining. Mined does not mean approved; only the refreshed read decides.
type ApprovalFuture = Shared<BoxFuture<'static, Result<U256, ClassifiedError>>>;

struct InFlight {
    amount: U256,
    fut: ApprovalFuture,
}

/// Drives one (token, spender) pair to an approved state.
///
/// Scoped to the ledger's active chain and account. Changing token, spender,
/// or network means building a new manager (or calling [`reset`]); a cached
/// [`PermitGrant`] is meaningless under any other key.
///
/// [`reset`]: ApprovalManager::reset
pub struct ApprovalManager {
    ledger: Arc<dyn Ledger>,
    token: Address,
    spender: Address,
    permit: Option<PermitSupport>,
    /// Account-abstraction signers cannot produce the raw-key signature the
    /// permit mechanism needs and are forced onto the on-ledger path.
    signer_can_permit: bool,
    status: Mutex<ApprovalStatus>,
    grant: Mutex<Option<PermitGrant>>,
    allowance: Mutex<Option<U256>>,
    in_flight: Mutex<Option<InFlight>>,
}

impl ApprovalManager {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        token: Address,
        spender: Address,
        permit: Option<PermitSupport>,
        signer_can_permit: bool,
    ) -> Self {
        Self {
            ledger,
            token,
            spender,
            permit,
            signer_can_permit,
            status: Mutex::new(ApprovalStatus::Idle),
            grant: Mutex::new(None),
            allowance: Mutex::new(None),
            in_flight: Mutex::new(None),
        }
    }

    pub fn status(&self) -> ApprovalStatus {
        self.status.lock().unwrap().clone()
    }

    /// The cached permit grant, if a permit was signed for the last amount.
    pub fn grant(&self) -> Option<PermitGrant> {
        self.grant.lock().unwrap().clone()
    }

    /// Discard all cached state. Safe at any time: the worst case of dropping
    /// a grant or allowance read is an extra prompt, never a wrong approval.
    pub fn reset(&self) {
        *self.grant.lock().unwrap() = None;
        *self.allowance.lock().unwrap() = None;
        *self.in_flight.lock().unwrap() = None;
        *self.status.lock().unwrap() = ApprovalStatus::Idle;
    }

    /// Report whether the spender is already authorized for `amount`.
    ///
    /// `None` means the caller is still composing input: no network activity,
    /// status stays `Idle`. A matching cached grant satisfies without any
    /// ledger read; otherwise the current allowance is fetched and cached.
    pub async fn check(&self, amount: Option<U256>) -> Result<bool, ClassifiedError> {
        let Some(amount) = amount else {
            self.set_status(ApprovalStatus::Idle);
            return Ok(false);
        };

        if self.grant_covers(amount) {
            self.set_status(ApprovalStatus::Approved);
            return Ok(true);
        }

        self.set_status(ApprovalStatus::Checking);
        let allowance = self.read_allowance().await?;

        if allowance >= amount {
            self.set_status(ApprovalStatus::Approved);
            Ok(true)
        } else {
            self.set_status(ApprovalStatus::NeedsApproval);
            Ok(false)
        }
    }

    /// Make the spender authorized for exactly `amount`.
    ///
    /// Resolves `Ok(true)` once authorized. Already-satisfied requests return
    /// immediately without touching the ledger. Concurrent calls for the same
    /// amount on the on-ledger path share a single submitted transaction.
    pub async fn approve(&self, amount: U256) -> Result<bool, ClassifiedError> {
        if self.grant_covers(amount) {
            self.set_status(ApprovalStatus::Approved);
            return Ok(true);
        }

        let known = *self.allowance.lock().unwrap();
        let allowance = match known {
            Some(value) => value,
            None => {
                self.set_status(ApprovalStatus::Checking);
                self.read_allowance().await?
            }
        };
        if allowance >= amount {
            self.set_status(ApprovalStatus::Approved);
            return Ok(true);
        }

        if self.permit.is_some() && self.signer_can_permit {
            self.approve_with_permit(amount).await
        } else {
            self.approve_on_ledger(amount).await
        }
    }

    async fn approve_with_permit(&self, amount: U256) -> Result<bool, ClassifiedError> {
        self.set_status(ApprovalStatus::SigningPermit);

        match self.sign_grant(amount).await {
            Ok(grant) => {
                debug!(value = %grant.value, "permit grant cached");
                *self.grant.lock().unwrap() = Some(grant);
                self.set_status(ApprovalStatus::Approved);
                Ok(true)
            }
            Err(err) => Err(self.fail(&err)),
        }
    }

    async fn sign_grant(&self, amount: U256) -> Result<PermitGrant, LedgerError> {
        let nonce = self.ledger.permit_nonce(self.token).await?;
        let name = self.ledger.token_name(self.token).await?;

        let version = match self.permit.as_ref().and_then(|p| p.version.as_deref()) {
            Some(version) => version,
            None => {
                warn!(
                    token = %self.token,
                    "no permit-domain version configured, assuming \"{DEFAULT_PERMIT_VERSION}\""
                );
                DEFAULT_PERMIT_VERSION
            }
        };

        let domain = permit_domain(&name, version, self.ledger.chain_id(), self.token);
        let deadline = permit_deadline(SystemTime::now());

        let message = Permit {
            owner: self.ledger.owner(),
            spender: self.spender,
            value: amount,
            nonce,
            deadline,
        };

        let signature = self.ledger.sign_permit(&domain, &message).await?;

        Ok(PermitGrant {
            signature: PermitSignature::from_signature(&signature, deadline),
            value: amount,
        })
    }

    async fn approve_on_ledger(&self, amount: U256) -> Result<bool, ClassifiedError> {
        let fut = {
            let mut slot = self.in_flight.lock().unwrap();
            match slot.as_ref() {
                // Attach to the in-flight approval instead of submitting a
                // second transaction for the same amount.
                Some(in_flight) if in_flight.amount == amount => in_flight.fut.clone(),
                _ => {
                    let fut = submit_approval(
                        self.ledger.clone(),
                        self.token,
                        self.spender,
                        amount,
                    )
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        amount,
                        fut: fut.clone(),
                    });
                    self.set_status(ApprovalStatus::Approving);
                    fut
                }
            }
        };

        let result = fut.await;

        // Release the slot whether the shared outcome was success or failure,
        // so a retry can submit again.
        {
            let mut slot = self.in_flight.lock().unwrap();
            if slot.as_ref().is_some_and(|f| f.amount == amount) {
                *slot = None;
            }
        }

        match result {
            Ok(refreshed) => {
                *self.allowance.lock().unwrap() = Some(refreshed);
                if refreshed >= amount {
                    self.set_status(ApprovalStatus::Approved);
                    Ok(true)
                } else {
                    // Mined, but a race or non-standard token left it short.
                    self.set_status(ApprovalStatus::NeedsApproval);
                    Ok(false)
                }
            }
            Err(classified) => {
                self.set_status(ApprovalStatus::Error(classified.clone()));
                Err(classified)
            }
        }
    }

    async fn read_allowance(&self) -> Result<U256, ClassifiedError> {
        match self.ledger.allowance(self.token, self.spender).await {
            Ok(allowance) => {
                *self.allowance.lock().unwrap() = Some(allowance);
                Ok(allowance)
            }
            Err(err) => Err(self.fail(&err)),
        }
    }

    fn grant_covers(&self, amount: U256) -> bool {
        self.grant
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|grant| grant.covers(amount))
    }

    fn fail(&self, err: &LedgerError) -> ClassifiedError {
        error!(error = %err, token = %self.token, spender = %self.spender, "approval failed");
        let classified = classify(&RawFailure::from(err));
        self.set_status(ApprovalStatus::Error(classified.clone()));
        classified
    }

    fn set_status(&self, status: ApprovalStatus) {
        *self.status.lock().unwrap() = status;
    }
}

/// Calldata for a standard ERC-20 approval of exactly `amount`.
pub fn approve_call(token: Address, spender: Address, amount: U256) -> CallRequest {
    let data = IERC20Permit::approveCall { spender, amount }.abi_encode();
    CallRequest::new(token, Bytes::from(data))
}

async fn submit_approval(
    ledger: Arc<dyn Ledger>,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<U256, ClassifiedError> {
    let on_err = |err: &LedgerError| {
        error!(error = %err, "on-ledger approval failed");
        classify(&RawFailure::from(err))
    };

    let call = approve_call(token, spender, amount);
    let hash = ledger.submit(&call).await.map_err(|e| on_err(&e))?;
    let receipt = ledger.wait_for_receipt(hash).await.map_err(|e| on_err(&e))?;

    if !receipt.is_success() {
        warn!(tx = %receipt.tx_hash, "approval transaction reverted");
    }

    // Never assume the mined approval took effect; only the refreshed
    // allowance decides.
    ledger.allowance(token, spender).await.map_err(|e| on_err(&e))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use alloy::sol_types::SolCall;

    use super::*;
    use crate::ledger::mock::MockLedger;

    fn token() -> Address {
        Address::repeat_byte(0x01)
    }

    fn spender() -> Address {
        Address::repeat_byte(0x02)
    }

    fn manager(ledger: Arc<MockLedger>, permit: Option<PermitSupport>) -> ApprovalManager {
        ApprovalManager::new(ledger, token(), spender(), permit, true)
    }

    #[tokio::test]
    async fn no_amount_means_idle_and_no_network() {
        let ledger = Arc::new(MockLedger::default());
        let mgr = manager(ledger.clone(), None);

        assert!(!mgr.check(None).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::Idle);
        assert_eq!(ledger.allowance_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn approve_is_a_no_op_when_allowance_covers() {
        let ledger = Arc::new(MockLedger::with_allowance(U256::from(150)));
        let mgr = manager(ledger.clone(), None);

        assert!(mgr.check(Some(U256::from(100))).await.unwrap());
        assert_eq!(ledger.allowance_reads.load(Ordering::SeqCst), 1);

        // Satisfied from the cached read: no further ledger activity.
        assert!(mgr.approve(U256::from(100)).await.unwrap());
        assert_eq!(ledger.allowance_reads.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.submitted_count(), 0);
        assert_eq!(mgr.status(), ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn zero_allowance_is_a_value_not_unknown() {
        let ledger = Arc::new(MockLedger::default());
        let mgr = manager(ledger.clone(), None);

        assert!(!mgr.check(Some(U256::from(1))).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::NeedsApproval);

        // The zero read is cached; approve() does not re-read.
        let _ = mgr.approve(U256::from(1)).await;
        assert_eq!(ledger.allowance_reads.load(Ordering::SeqCst), 2); // check + post-mine re-read
    }

    #[tokio::test]
    async fn permit_path_signs_instead_of_submitting() {
        let ledger = Arc::new(MockLedger::default());
        let mgr = manager(
            ledger.clone(),
            Some(PermitSupport {
                version: Some("1".to_owned()),
            }),
        );

        assert!(mgr.approve(U256::from(50)).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::Approved);
        assert_eq!(ledger.submitted_count(), 0);

        let grant = mgr.grant().expect("grant should be cached");
        assert_eq!(grant.value, U256::from(50));

        let signed = ledger.signed_permits.lock().unwrap();
        let (domain, message) = &signed[0];
        assert_eq!(domain.name.as_deref(), Some("Ward Token"));
        assert_eq!(domain.version.as_deref(), Some("1"));
        assert_eq!(domain.chain_id, Some(U256::from(31337)));
        assert_eq!(domain.verifying_contract, Some(token()));
        assert_eq!(message.value, U256::from(50));
        assert_eq!(message.spender, spender());
        assert_eq!(message.owner, ledger.owner);
    }

    #[tokio::test]
    async fn cached_grant_never_covers_a_different_amount() {
        let ledger = Arc::new(MockLedger::default());
        let mgr = manager(
            ledger.clone(),
            Some(PermitSupport {
                version: Some("1".to_owned()),
            }),
        );

        assert!(mgr.approve(U256::from(50)).await.unwrap());

        // A smaller request is still not covered: the signature authorizes
        // exactly 50, nothing else.
        assert!(!mgr.check(Some(U256::from(25))).await.unwrap());
        assert!(!mgr.check(Some(U256::from(75))).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::NeedsApproval);

        assert!(mgr.check(Some(U256::from(50))).await.unwrap());
    }

    #[tokio::test]
    async fn incapable_signer_forces_on_ledger_path() {
        let ledger = Arc::new(MockLedger::default());
        *ledger.allowance_after_mine.lock().unwrap() = Some(U256::from(100));
        let mgr = ApprovalManager::new(
            ledger.clone(),
            token(),
            spender(),
            Some(PermitSupport {
                version: Some("1".to_owned()),
            }),
            false, // smart-contract wallet
        );

        assert!(mgr.approve(U256::from(100)).await.unwrap());
        assert_eq!(ledger.submitted_count(), 1);
        assert!(ledger.signed_permits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_ledger_path_submits_and_verifies_by_re_read() {
        let ledger = Arc::new(MockLedger::default());
        *ledger.allowance_after_mine.lock().unwrap() = Some(U256::from(100));
        let mgr = manager(ledger.clone(), None);

        assert!(!mgr.check(Some(U256::from(100))).await.unwrap());
        assert!(mgr.approve(U256::from(100)).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::Approved);

        let submitted = ledger.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].to, token());
        assert_eq!(
            &submitted[0].data[..4],
            IERC20Permit::approveCall::SELECTOR.as_slice()
        );
    }

    #[tokio::test]
    async fn mined_but_short_allowance_is_not_approved() {
        let ledger = Arc::new(MockLedger::default());
        // The re-read comes back below the requested amount.
        *ledger.allowance_after_mine.lock().unwrap() = Some(U256::from(40));
        let mgr = manager(ledger.clone(), None);

        assert!(!mgr.approve(U256::from(100)).await.unwrap());
        assert_eq!(mgr.status(), ApprovalStatus::NeedsApproval);
    }

    #[tokio::test]
    async fn concurrent_approvals_share_one_transaction() {
        let mut mock = MockLedger::default();
        mock.submit_delay = Some(Duration::from_millis(20));
        *mock.allowance_after_mine.lock().unwrap() = Some(U256::from(100));
        let ledger = Arc::new(mock);
        let mgr = manager(ledger.clone(), None);
        let _ = mgr.check(Some(U256::from(100))).await;

        let (a, b) = tokio::join!(mgr.approve(U256::from(100)), mgr.approve(U256::from(100)));

        assert!(a.unwrap());
        assert!(b.unwrap());
        assert_eq!(ledger.submitted_count(), 1);
    }

    #[tokio::test]
    async fn failure_classifies_and_releases_the_slot() {
        let ledger = Arc::new(MockLedger::default());
        *ledger.submit_error.lock().unwrap() = Some("connection refused".to_owned());
        let mgr = manager(ledger.clone(), None);
        let _ = mgr.check(Some(U256::from(10))).await;

        let err = mgr.approve(U256::from(10)).await.unwrap_err();
        assert!(err.is_network_error);
        assert!(matches!(mgr.status(), ApprovalStatus::Error(_)));

        // Retry works once the failure clears: the dedup slot was released.
        *ledger.submit_error.lock().unwrap() = None;
        *ledger.allowance_after_mine.lock().unwrap() = Some(U256::from(10));
        assert!(mgr.approve(U256::from(10)).await.unwrap());
        assert_eq!(ledger.submitted_count(), 1);
    }

    #[tokio::test]
    async fn permit_rejection_surfaces_as_user_rejection() {
        let ledger = Arc::new(MockLedger::default());
        *ledger.sign_error.lock().unwrap() = Some("User rejected the request.".to_owned());
        let mgr = manager(
            ledger.clone(),
            Some(PermitSupport {
                version: Some("1".to_owned()),
            }),
        );

        let err = mgr.approve(U256::from(5)).await.unwrap_err();
        assert!(err.is_user_rejection);
        assert!(mgr.grant().is_none());
        assert!(matches!(mgr.status(), ApprovalStatus::Error(_)));
    }

    #[tokio::test]
    async fn reset_discards_grant_and_cached_allowance() {
        let ledger = Arc::new(MockLedger::default());
        let mgr = manager(
            ledger.clone(),
            Some(PermitSupport {
                version: Some("1".to_owned()),
            }),
        );

        assert!(mgr.approve(U256::from(50)).await.unwrap());
        mgr.reset();
        assert!(mgr.grant().is_none());
        assert_eq!(mgr.status(), ApprovalStatus::Idle);
    }
}
