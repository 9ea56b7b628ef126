//! Command line plumbing shared by the workflow scripts.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use helpers::MidenProvider;
use registry_workflows::NodeEndpoint;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_NODE_ENDPOINT: &str = "MIDEN_NODE_ENDPOINT";
pub const ENV_DATA_DIRECTORY: &str = "MIDEN_DATA_DIRECTORY";
pub const ENV_RPC_TIMEOUT: &str = "MIDEN_RPC_TIMEOUT";

/// Arguments selecting the node and the local client state.
#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Node to talk to: `testnet`, `devnet`, `localhost` or an RPC url.
    #[arg(long, env = ENV_NODE_ENDPOINT, default_value = "testnet", value_name = "ENDPOINT")]
    pub endpoint: NodeEndpoint,

    /// Directory holding the client store and keystore.
    #[arg(long, env = ENV_DATA_DIRECTORY, default_value = ".", value_name = "DIR")]
    pub data_directory: PathBuf,

    /// Maximum duration of a single RPC request.
    #[arg(
        long = "rpc.timeout",
        env = ENV_RPC_TIMEOUT,
        default_value = "10s",
        value_parser = humantime::parse_duration,
        value_name = "DURATION"
    )]
    pub rpc_timeout: Duration,
}

impl ClientArgs {
    pub fn provider(&self) -> MidenProvider {
        let timeout_ms = u64::try_from(self.rpc_timeout.as_millis()).unwrap_or(u64::MAX);
        MidenProvider::new(&self.data_directory).with_timeout_ms(timeout_ms)
    }
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}
