//! `ledger-submit`: invoke or query a contract from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use ledger_submit::config::load_config;
use ledger_submit::observability::logging;
use ledger_submit::{Client, X509Identity};

#[derive(Parser)]
#[command(name = "ledger-submit")]
#[command(about = "Submit and query transactions on a permissioned ledger", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, default_value = "ledger-submit.toml")]
    config: PathBuf,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Endorse, order and wait for the commit of a transaction
    Invoke {
        /// Contract arguments, function name first
        #[arg(required = true)]
        args: Vec<String>,
    },
    /// Evaluate a transaction on the peers without ordering it
    Query {
        #[arg(required = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    tracing::info!(
        channel = %config.channel,
        contract = %config.contract.name,
        peers = config.peers.len(),
        orderers = config.orderers.len(),
        "Configuration loaded"
    );

    let identity = X509Identity::from_config(&config.identity)?;
    let client = Client::from_config(&config, Arc::new(identity))?;

    match cli.command {
        Commands::Invoke { args } => {
            let args: Vec<Vec<u8>> = args.into_iter().map(String::into_bytes).collect();
            let outcome = client.submit(&args, Default::default()).await?;
            if cli.json {
                println!(
                    "{}",
                    json!({ "tx_id": outcome.tx_id, "code": outcome.code.as_str_name() })
                );
            } else {
                println!("{} {}", outcome.tx_id, outcome.code);
            }
            Ok(if outcome.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Query { args } => {
            let args: Vec<Vec<u8>> = args.into_iter().map(String::into_bytes).collect();
            let payload = client.query(&args).await?;
            if cli.json {
                let out = json!({
                    "payload": String::from_utf8_lossy(&payload),
                    "hex": hex::encode(&payload),
                });
                println!("{}", out);
            } else {
                println!("{}", String::from_utf8_lossy(&payload));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
