use alloy::{providers::ProviderBuilder, signers::local::PrivateKeySigner};
use eyre::Result;

use crate::config::WardConfig;
use ward_core::ProtocolClient;

pub async fn status(rpc_url: &str, config: &WardConfig, key: &str) -> Result<()> {
    let signer: PrivateKeySigner = key.parse()?;
    let owner = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(signer.clone())
        .connect(rpc_url)
        .await?;

    let client = ProtocolClient::new(provider, signer, owner, config.protocol_config());
    let status = client.fetch_account_status().await?;

    println!("account:            {owner}");
    println!("registered agent:   {}", status.registered);
    println!("stake:              {}", status.stake);
    println!("token balance:      {}", status.token_balance);
    println!("registry allowance: {}", status.allowance_for_registry);
    println!("platform fee (bps): {}", status.platform_fee_bps);

    Ok(())
}
