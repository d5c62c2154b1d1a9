//! Listing bot for the BitVerse collections on Immutable X.
//!
//! `watch` direct-messages subscribers whenever the cheapest listing of a
//! configured rarity tier drops under its threshold. `market`, `rates` and
//! `asset` answer one query and exit.

mod bot;
mod commands;
mod config;
mod error;

use clap::Parser;
use std::process::exit;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bot::ListingBot;
use config::{Cli, Command, EnvConfig};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let cli = Cli::parse();

    // Logs go to stderr, stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    let client = reqwest::Client::new();
    let result = match &cli.command {
        Command::Watch => match ListingBot::try_new(&env_config, client) {
            Ok(mut bot) => bot.run().await,
            Err(e) => {
                eprintln!("Failed to create listing bot: {}", e);
                exit(1);
            }
        },
        Command::Market(args) => commands::market(&env_config, client, args).await,
        Command::Rates => commands::rates(&env_config, client).await,
        Command::Asset(args) => commands::asset(&env_config, client, args).await,
    };

    if let Err(e) = result {
        error!(%e, "Listing bot encountered an error, shutting down");
        exit(1);
    }
}
