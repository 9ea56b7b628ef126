use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use registry_workflows::config::{
    DEFAULT_PAYMENT_TOKEN_ID, DEFAULT_REGISTRY_CONTRACT_ID, REGISTRY_LIBRARY_PATH,
};
use registry_workflows::{change_token, ConfigUpdateConfig, ContractLibrary, StageLog};
use scripts::{init_tracing, ClientArgs};

/// Sets the payment token accepted by the registry contract.
#[derive(Debug, Parser)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    /// Registry contract account id.
    #[arg(long, env = "REGISTRY_CONTRACT_ID", default_value = DEFAULT_REGISTRY_CONTRACT_ID)]
    contract_id: String,

    /// Faucet account id of the token to accept as payment.
    #[arg(long, env = "REGISTRY_PAYMENT_TOKEN_ID", default_value = DEFAULT_PAYMENT_TOKEN_ID)]
    payment_token_id: String,

    /// MASM source of the registry contract.
    #[arg(
        long,
        env = "REGISTRY_CONTRACT_SOURCE",
        default_value = "contracts/registry/registry.masm",
        value_name = "FILE"
    )]
    contract_source: PathBuf,

    /// Path the contract library is linked under.
    #[arg(long, default_value = REGISTRY_LIBRARY_PATH)]
    library_path: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let source = std::fs::read_to_string(&cli.contract_source).with_context(|| {
        format!("failed to read contract source {}", cli.contract_source.display())
    })?;

    let config = ConfigUpdateConfig {
        endpoint: cli.client.endpoint.clone(),
        contract_id: cli.contract_id.into(),
        payment_token_id: cli.payment_token_id.into(),
        library: ContractLibrary::new(cli.library_path, source),
    };

    let mut stages = StageLog::new();
    let update = change_token(&cli.client.provider(), &config, &mut stages)
        .await
        .context("failed to set payment token")?;

    println!("Payment token set successfully");
    println!("Transaction ID: {}", update.tx_id.to_hex());
    println!("Token ID: {}", update.token_id);
    println!("Token prefix: {}", update.token_prefix.as_int());
    println!("Token suffix: {}", update.token_suffix.as_int());

    Ok(())
}
