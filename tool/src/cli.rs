//! # CLI Interface
//!
//! Command-line arguments for `nxt-tool`, defined with `clap` derive. Every
//! subcommand works offline and prints JSON on stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Offline inspection of NXT keys, addresses and transactions.
#[derive(Parser, Debug)]
#[command(name = "nxt-tool", version, propagate_version = true)]
pub struct NxtToolCli {
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "NXT_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, global = true, env = "NXT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive the public key, account id and address of a secret phrase.
    Account(AccountArgs),
    /// Convert between numeric account ids and Reed-Solomon addresses.
    Address {
        #[command(subcommand)]
        command: AddressCommand,
    },
    /// Parse hex transaction bytes and print the JSON form.
    Decode(DecodeArgs),
}

#[derive(Parser, Debug)]
pub struct AccountArgs {
    /// The account's secret phrase. Prefer the environment variable over
    /// the flag so the phrase stays out of shell history.
    #[arg(long, env = "NXT_SECRET_PHRASE", hide_env_values = true)]
    pub secret_phrase: String,
}

#[derive(Subcommand, Debug)]
pub enum AddressCommand {
    /// Numeric id to `NXT-XXXX-XXXX-XXXX-XXXXX`.
    Encode {
        /// Unsigned decimal account id.
        id: String,
    },
    /// Reed-Solomon address (with or without `NXT-`) to numeric id.
    Decode {
        address: String,
    },
}

#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Transaction bytes as hex.
    pub hex: String,

    /// JSON file with network fee heights, e.g. `{"nextFeeHeight": 500000}`.
    #[arg(long, env = "NXT_CHAIN_PARAMS")]
    pub chain_params: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        NxtToolCli::command().debug_assert();
    }

    #[test]
    fn parses_nested_address_command() {
        let cli = NxtToolCli::try_parse_from(["nxt-tool", "address", "decode", "NXT-2E3T-2222-2YW9-22222"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Address {
                command: AddressCommand::Decode { .. }
            }
        ));
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_is_a_global_flag() {
        let cli = NxtToolCli::try_parse_from(["nxt-tool", "decode", "00", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
