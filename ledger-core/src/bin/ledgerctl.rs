//! Operator tool: key generation, transfer signing, offline verification

use anyhow::Context;
use clap::{Parser, Subcommand};
use ledger_core::{crypto::KeyPair, Config, Ledger};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ledgerctl")]
#[command(about = "Chainledger operator tool", long_about = None)]
struct Cli {
    /// Optional TOML config file (LEDGER_* env vars still apply)
    #[arg(short, long, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an ed25519 key pair for a person
    Keygen {
        /// Person the keys belong to
        person: String,
        /// Output directory
        #[arg(long, default_value = "keys")]
        out_dir: PathBuf,
    },

    /// Sign a transfer with a private key
    Sign {
        /// PKCS#8 PEM private key
        #[arg(long)]
        key: PathBuf,
        /// Sender
        #[arg(long)]
        p1: String,
        /// Recipient
        #[arg(long)]
        p2: String,
        /// Amount
        #[arg(long)]
        a: Decimal,
        /// ISO-8601 timestamp, submitted alongside the signature
        #[arg(long)]
        t: String,
    },

    /// Verify the stored ledger and print the integrity report
    Verify {
        /// Data directory (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { person, out_dir } => {
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("cannot create {}", out_dir.display()))?;

            let keypair = KeyPair::generate();
            let private_path = out_dir.join(format!("{}_private.pem", person));
            let public_path = out_dir.join(format!("{}_public.pem", person));

            fs::write(&private_path, keypair.private_key_pem()?)?;
            fs::write(&public_path, keypair.public_key_pem()?)?;

            println!("private key: {}", private_path.display());
            println!("public key:  {}", public_path.display());
            println!("register it with: POST /keys/{}", person);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Sign { key, p1, p2, a, t } => {
            let pem = fs::read_to_string(&key)
                .with_context(|| format!("cannot read {}", key.display()))?;
            let keypair = KeyPair::from_private_key_pem(&pem)?;

            println!("{}", keypair.sign_transfer(&p1, &p2, &t, &a));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Verify { data_dir } => {
            let mut config = match cli.config {
                Some(path) => Config::from_file(path)?.with_env_overrides()?,
                None => Config::from_env()?,
            };
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }

            let ledger = Ledger::open(&config)?;
            let report = ledger.verify()?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            Ok(if report.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
