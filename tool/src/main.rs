// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NXT Inspection Tool
//!
//! Entry point for the `nxt-tool` binary. Parses CLI arguments, initializes
//! logging and runs one offline subcommand:
//!
//! - `account`          — key material and address of a secret phrase
//! - `address encode`   — numeric id to Reed-Solomon address
//! - `address decode`   — Reed-Solomon address to numeric id
//! - `decode`           — transaction bytes to JSON, with id and signature check

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use nxt_protocol::config::ChainParams;
use nxt_protocol::crypto::{keys, parse_account_id, KeyPair};
use nxt_protocol::numeric::{parse_hex, parse_unsigned_long};
use nxt_protocol::transaction::Transaction;

use cli::{AddressCommand, Commands, NxtToolCli};

fn main() -> Result<()> {
    let cli = NxtToolCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let output = match cli.command {
        Commands::Account(args) => account(&args.secret_phrase)?,
        Commands::Address { command } => address(command)?,
        Commands::Decode(args) => decode(&args)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn account(secret_phrase: &str) -> Result<Value> {
    let keys = KeyPair::from_secret_phrase(secret_phrase)
        .context("secret phrase does not give a usable key")?;
    Ok(json!({
        "publicKey": keys.public_key().to_hex(),
        "account": keys.account_id().to_string(),
        "accountRS": keys.rs_address(),
    }))
}

fn address(command: AddressCommand) -> Result<Value> {
    let id = match command {
        AddressCommand::Encode { id } => {
            parse_unsigned_long(&id).with_context(|| format!("invalid account id {id:?}"))?
        }
        AddressCommand::Decode { address } => {
            parse_account_id(&address).with_context(|| format!("invalid address {address:?}"))?
        }
    };
    Ok(json!({
        "account": id.to_string(),
        "accountRS": keys::rs_address(id),
    }))
}

fn decode(args: &cli::DecodeArgs) -> Result<Value> {
    let params = match &args.chain_params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<ChainParams>(&text)
                .with_context(|| format!("invalid chain parameters in {}", path.display()))?
        }
        None => ChainParams::default(),
    };
    let bytes = parse_hex(args.hex.trim()).context("transaction is not valid hex")?;
    let tx = Transaction::parse(&bytes, &params).context("failed to parse transaction")?;
    tracing::info!(
        transaction_type = %tx.transaction_type(),
        size = bytes.len(),
        "transaction parsed"
    );

    let mut output = json!({
        "transactionJSON": tx.to_json()?,
        "sender": tx.sender_id().to_string(),
        "senderRS": keys::rs_address(tx.sender_id()),
        "verified": tx.verify_signature(),
    });
    if tx.signature().is_some() {
        output["transaction"] = json!(tx.string_id()?);
        output["fullHash"] = json!(tx.full_hash_hex()?);
    }
    Ok(output)
}
