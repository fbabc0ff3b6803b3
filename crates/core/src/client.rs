use std::time::Duration;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, Signature, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::Signer,
    sol_types::{Eip712Domain, SolCall},
};
use async_trait::async_trait;
use ward_abi::{EscrowParams, IAgentRegistry, IERC20Permit, IEscrow, IEscrowFactory, IFeeManager, Permit};

use crate::{
    config::ProtocolConfig,
    error::LedgerError,
    ledger::{CallRequest, Ledger, Receipt, ReceiptStatus},
    permit::PermitGrant,
};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Point-in-time view of the connected account, for dashboards.
#[derive(Clone, Debug)]
pub struct AccountStatus {
    pub registered: bool,
    pub stake: U256,
    pub allowance_for_registry: U256,
    pub token_balance: U256,
    pub platform_fee_bps: U256,
}

/// Alloy-backed [`Ledger`] implementation plus typed call builders for the
/// protocol's operations.
///
/// `provider` is expected to carry a wallet layer (built via
/// `ProviderBuilder::new().wallet(..)`) so submitted calls are signed; the
/// separate `signer` is used only for EIP-712 permit messages.
pub struct ProtocolClient<P, S>
where
    P: Provider + Clone,
    S: Signer + Send + Sync,
{
    provider: P,
    signer: S,
    owner: Address,
    config: ProtocolConfig,
}

impl<P, S> ProtocolClient<P, S>
where
    P: Provider + Clone,
    S: Signer + Send + Sync,
{
    pub fn new(provider: P, signer: S, owner: Address, config: ProtocolConfig) -> Self {
        Self {
            provider,
            signer,
            owner,
            config,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub async fn fetch_account_status(&self) -> Result<AccountStatus, LedgerError> {
        let token = IERC20Permit::new(self.config.token.address, &self.provider);
        let registry = IAgentRegistry::new(self.config.registry, &self.provider);
        let fees = IFeeManager::new(self.config.fee_manager, &self.provider);

        let (allowance, balance, registered, stake, fee_bps) = self
            .provider
            .multicall()
            .add(token.allowance(self.owner, self.config.registry))
            .add(token.balanceOf(self.owner))
            .add(registry.isRegistered(self.owner))
            .add(registry.stakeOf(self.owner))
            .add(fees.platformFeeBps())
            .aggregate()
            .await?;

        Ok(AccountStatus {
            registered,
            stake,
            allowance_for_registry: allowance,
            token_balance: balance,
            platform_fee_bps: fee_bps,
        })
    }

    // --- call builders -----------------------------------------------------

    pub fn approve_call(&self, spender: Address, amount: U256) -> CallRequest {
        crate::approval::approve_call(self.config.token.address, spender, amount)
    }

    pub fn register_agent_call(&self, profile_uri: &str) -> CallRequest {
        let data = IAgentRegistry::registerAgentCall {
            profileUri: profile_uri.to_owned(),
        }
        .abi_encode();
        CallRequest::new(self.config.registry, Bytes::from(data))
    }

    pub fn stake_call(&self, amount: U256) -> CallRequest {
        let data = IAgentRegistry::stakeCall { amount }.abi_encode();
        CallRequest::new(self.config.registry, Bytes::from(data))
    }

    /// Stake in a single transaction, consuming a signed permit grant. The
    /// grant must have been produced for exactly this amount.
    pub fn stake_with_permit_call(&self, amount: U256, grant: &PermitGrant) -> CallRequest {
        let data = IAgentRegistry::stakeWithPermitCall {
            amount,
            deadline: grant.signature.deadline,
            v: grant.signature.v,
            r: grant.signature.r,
            s: grant.signature.s,
        }
        .abi_encode();
        CallRequest::new(self.config.registry, Bytes::from(data))
    }

    pub fn unstake_call(&self, amount: U256) -> CallRequest {
        let data = IAgentRegistry::unstakeCall { amount }.abi_encode();
        CallRequest::new(self.config.registry, Bytes::from(data))
    }

    pub fn update_platform_fee_call(&self, new_fee_bps: U256) -> CallRequest {
        let data = IFeeManager::updatePlatformFeeCall {
            newFeeBps: new_fee_bps,
        }
        .abi_encode();
        CallRequest::new(self.config.fee_manager, Bytes::from(data))
    }

    pub fn deploy_escrow_call(&self, params: EscrowParams) -> CallRequest {
        let data = IEscrowFactory::deployEscrowCall { params }.abi_encode();
        CallRequest::new(self.config.factory, Bytes::from(data))
    }

    pub fn fund_escrow_call(&self, escrow: Address) -> CallRequest {
        CallRequest::new(escrow, Bytes::from(IEscrow::fundCall {}.abi_encode()))
    }

    pub fn release_escrow_call(&self, escrow: Address) -> CallRequest {
        CallRequest::new(escrow, Bytes::from(IEscrow::releaseCall {}.abi_encode()))
    }

    pub fn raise_dispute_call(&self, escrow: Address) -> CallRequest {
        CallRequest::new(escrow, Bytes::from(IEscrow::raiseDisputeCall {}.abi_encode()))
    }

    fn build_tx(&self, call: &CallRequest) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.owner)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value)
            // Always pin the active network; never inherit whatever the
            // signer was last configured for.
            .with_chain_id(self.config.chain_id)
    }
}

#[async_trait]
impl<P, S> Ledger for ProtocolClient<P, S>
where
    P: Provider + Clone,
    S: Signer + Send + Sync,
{
    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    fn owner(&self) -> Address {
        self.owner
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256, LedgerError> {
        let erc20 = IERC20Permit::new(token, &self.provider);
        Ok(erc20.allowance(self.owner, spender).call().await?)
    }

    async fn permit_nonce(&self, token: Address) -> Result<U256, LedgerError> {
        let erc20 = IERC20Permit::new(token, &self.provider);
        Ok(erc20.nonces(self.owner).call().await?)
    }

    async fn token_name(&self, token: Address) -> Result<String, LedgerError> {
        let erc20 = IERC20Permit::new(token, &self.provider);
        Ok(erc20.name().call().await?)
    }

    async fn submit(&self, call: &CallRequest) -> Result<TxHash, LedgerError> {
        let tx = self.build_tx(call);
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, LedgerError> {
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(hash).await? {
                let status = if receipt.status() {
                    ReceiptStatus::Success
                } else {
                    ReceiptStatus::Reverted
                };
                return Ok(Receipt {
                    tx_hash: hash,
                    status,
                    block_number: receipt.block_number.unwrap_or_default(),
                });
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn simulate(&self, call: &CallRequest) -> Result<Bytes, LedgerError> {
        let tx = self.build_tx(call);
        match self.provider.call(tx).await {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                let data = err
                    .as_error_resp()
                    .and_then(|payload| payload.as_revert_data());
                match data {
                    Some(data) => Err(LedgerError::Reverted {
                        message: err.to_string(),
                        data: Some(data),
                    }),
                    None => Err(err.into()),
                }
            }
        }
    }

    async fn sign_permit(
        &self,
        domain: &Eip712Domain,
        message: &Permit,
    ) -> Result<Signature, LedgerError> {
        Ok(self.signer.sign_typed_data(message, domain).await?)
    }
}
