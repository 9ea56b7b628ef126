mod config_update;
mod faucet;

pub use config_update::{change_token, update_payment_token, TokenUpdate};
pub use faucet::{create_faucet, provision_faucet, Consumption, FaucetOutcome};
