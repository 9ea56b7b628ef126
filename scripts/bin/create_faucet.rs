use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use miden_client::note::NoteType;
use registry_workflows::config::{
    DEFAULT_FAUCET_ID, DEFAULT_MINT_AMOUNT, DEFAULT_RECIPIENT, DEFAULT_TOKEN_SYMBOL,
};
use registry_workflows::{
    create_faucet, Backoff, Consumption, Delays, FaucetConfig, FaucetSource, FaucetSpec,
    PollPolicy, StageLog, TokioSleeper,
};
use scripts::{init_tracing, ClientArgs};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NoteVisibility {
    Public,
    Private,
}

impl From<NoteVisibility> for NoteType {
    fn from(visibility: NoteVisibility) -> Self {
        match visibility {
            NoteVisibility::Public => NoteType::Public,
            NoteVisibility::Private => NoteType::Private,
        }
    }
}

/// Mints tokens from a faucet to a recipient account and consumes the minted notes.
#[derive(Debug, Parser)]
struct Cli {
    #[command(flatten)]
    client: ClientArgs,

    /// Account receiving the minted tokens, as an address or a hex account id.
    #[arg(long, env = "FAUCET_RECIPIENT", default_value = DEFAULT_RECIPIENT)]
    recipient: String,

    /// Existing faucet to mint from. Ignored with `--deploy`.
    #[arg(long, env = "FAUCET_ID", default_value = DEFAULT_FAUCET_ID)]
    faucet_id: String,

    /// Deploy a new public fungible faucet instead of using `--faucet-id`.
    #[arg(long, default_value_t = false)]
    deploy: bool,

    /// Token symbol, shown in logs and used for deployed faucets.
    #[arg(long, default_value = DEFAULT_TOKEN_SYMBOL)]
    symbol: String,

    /// Decimals of a deployed faucet.
    #[arg(long, default_value_t = 8)]
    decimals: u8,

    /// Maximum supply of a deployed faucet, in base units.
    #[arg(long, default_value_t = 1_000_000_000_000_000)]
    max_supply: u64,

    /// Amount to mint, in base units.
    #[arg(long, default_value_t = DEFAULT_MINT_AMOUNT)]
    amount: u64,

    #[arg(long, value_enum, default_value_t = NoteVisibility::Public)]
    note_type: NoteVisibility,

    /// Pause after creating accounts.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration, value_name = "DURATION")]
    settle_delay: Duration,

    /// Pause between submitting the mint and looking for notes.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, value_name = "DURATION")]
    mint_confirmation_delay: Duration,

    /// Number of times to query notes again after an empty or failed answer.
    #[arg(long = "poll.retries", default_value_t = 3)]
    poll_retries: u32,

    /// Delay before each retry. Doubles on every retry when `poll.max-backoff` is set.
    #[arg(long = "poll.backoff", default_value = "15s", value_parser = humantime::parse_duration, value_name = "DURATION")]
    poll_backoff: Duration,

    /// Upper bound of an exponential backoff.
    #[arg(long = "poll.max-backoff", value_parser = humantime::parse_duration, value_name = "DURATION")]
    poll_max_backoff: Option<Duration>,
}

impl Cli {
    fn faucet_config(&self) -> FaucetConfig {
        let faucet = if self.deploy {
            FaucetSource::Deploy(FaucetSpec {
                decimals: self.decimals,
                max_supply: self.max_supply,
                ..FaucetSpec::new(self.symbol.clone())
            })
        } else {
            FaucetSource::Existing(self.faucet_id.as_str().into())
        };

        let backoff = match self.poll_max_backoff {
            Some(max) => Backoff::Exponential { initial: self.poll_backoff, max },
            None => Backoff::Fixed(self.poll_backoff),
        };

        FaucetConfig {
            endpoint: self.client.endpoint.clone(),
            recipient: self.recipient.as_str().into(),
            faucet,
            amount: self.amount,
            note_type: self.note_type.into(),
            token_symbol: self.symbol.clone(),
            delays: Delays {
                settle: self.settle_delay,
                mint_confirmation: self.mint_confirmation_delay,
            },
            poll: PollPolicy { max_retries: self.poll_retries, backoff },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.faucet_config();

    let mut stages = StageLog::new();
    let outcome = create_faucet(&cli.client.provider(), &mut TokioSleeper, &config, &mut stages)
        .await
        .context("failed to provision faucet")?;

    println!("Faucet ID: {}", outcome.faucet_id);
    match outcome.consumption {
        Consumption::Consumed(tx_id) => {
            println!("Consume transaction ID: {}", tx_id.to_hex());
        },
        Consumption::Pending { attempts } => {
            println!("No consumable notes after {attempts} attempts.");
            println!("The notes may need to be consumed manually later.");
        },
    }

    Ok(())
}
