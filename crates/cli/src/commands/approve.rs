use std::sync::Arc;

use alloy::{
    primitives::{Address, U256},
    providers::ProviderBuilder,
    signers::local::PrivateKeySigner,
};
use eyre::Result;

use crate::config::WardConfig;
use ward_core::{ApprovalManager, Ledger, ProtocolClient};

/// Drive the approval manager for the protocol token until the spender
/// (the agent registry by default) is authorized for `amount`.
pub async fn approve(
    rpc_url: &str,
    config: &WardConfig,
    key: &str,
    amount: U256,
    spender: Option<Address>,
) -> Result<()> {
    let signer: PrivateKeySigner = key.parse()?;
    let owner = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(signer.clone())
        .connect(rpc_url)
        .await?;

    let protocol = config.protocol_config();
    let spender = spender.unwrap_or(protocol.registry);
    let token = protocol.token.address;
    let permit = protocol.token.permit.clone();

    let ledger: Arc<dyn Ledger> = Arc::new(ProtocolClient::new(provider, signer, owner, protocol));
    // A local key can always sign permit typed data.
    let manager = ApprovalManager::new(ledger, token, spender, permit, true);

    if manager.check(Some(amount)).await.map_err(|e| eyre::eyre!(e.message))? {
        println!("already approved: allowance covers {amount}");
        return Ok(());
    }

    match manager.approve(amount).await {
        Ok(true) => match manager.grant() {
            Some(grant) => println!(
                "permit signed for {} (deadline {})",
                grant.value, grant.signature.deadline
            ),
            None => println!("approval confirmed for {amount}"),
        },
        Ok(false) => println!("approval mined but allowance still short of {amount}"),
        Err(err) => {
            eprintln!("{}", err.message);
            std::process::exit(1);
        }
    }

    Ok(())
}
