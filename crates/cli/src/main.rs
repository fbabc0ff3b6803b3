use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ward_cli::{
    commands::{approve as approve_cmd, status as status_cmd},
    config::{DEFAULT_CONFIG_PATH, load_config, signer_key},
};

#[derive(Debug, Parser)]
#[command(name = "ward-cli", about = "Escrow protocol operator CLI", version)]
struct Cli {
    /// Path to the ward configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// RPC URL for the target chain (overrides the config file)
    #[arg(long, env = "WARD_RPC_URL", value_name = "URL")]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the connected account's registry and token status
    Status,

    /// Approve the protocol token for a spender (registry by default)
    Approve(ApproveArgs),
}

#[derive(Debug, Args)]
struct ApproveArgs {
    /// Amount to approve, in raw token units (decimal or 0x-prefixed hex)
    #[arg(long, value_name = "AMOUNT")]
    amount: String,

    /// Spender address; defaults to the agent registry
    #[arg(long, value_name = "ADDRESS")]
    spender: Option<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };

    let rpc_url = cli
        .rpc_url
        .or_else(|| config.chain.rpc_url.clone())
        .ok_or_else(|| eyre::eyre!("--rpc-url, WARD_RPC_URL, or chain.rpc_url is required"))?;

    let key = signer_key()?;

    match cli.command {
        Commands::Status => status_cmd::status(&rpc_url, &config, &key).await?,
        Commands::Approve(args) => {
            let amount = parse_u256(&args.amount)?;
            let spender = args
                .spender
                .as_deref()
                .map(|s| s.parse::<Address>())
                .transpose()?;
            approve_cmd::approve(&rpc_url, &config, &key, amount, spender).await?
        }
    }

    Ok(())
}

fn parse_u256(s: &str) -> eyre::Result<U256> {
    if let Some(stripped) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(U256::from_str_radix(stripped, 16)?)
    } else {
        Ok(U256::from_str_radix(s, 10)?)
    }
}
