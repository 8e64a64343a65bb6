//! Seed certification registry command line interface
//!
//! Key generation, digest signing and signer recovery for certificate
//! signatures, plus a scenario runner that drives an in-memory registry.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seedcert_crypto::{recover_signer, KeyPair, SignatureLayout};
use seedcert_registry::CertificateRegistry;
use seedcert_storage::MemoryStorage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

mod scenario;
mod settings;

use scenario::{decode_digest, decode_hex, run_scenario, Scenario};
use settings::{init_logging, AppConfig};

#[derive(Parser)]
#[command(name = "seedcert")]
#[command(about = "Seed certification registry tool")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a secp256k1 key and print its address
    Keygen {
        /// Derive from an existing secret key (hex) instead of generating one
        #[arg(long)]
        secret: Option<String>,
    },

    /// Sign a 32-byte digest
    Sign {
        /// Secret key (hex)
        #[arg(long)]
        secret: String,

        /// Digest to sign (hex)
        #[arg(long)]
        digest: String,
    },

    /// Recover the signer address of a digest signature
    Recover {
        /// Signed digest (hex)
        #[arg(long)]
        digest: String,

        /// 65-byte signature (hex)
        #[arg(long)]
        signature: String,

        /// Where to read `v` from: standard or legacy (defaults to the configured layout)
        #[arg(long)]
        layout: Option<SignatureLayout>,
    },

    /// Run a JSON scenario against a fresh in-memory registry
    Run {
        /// Scenario file
        scenario: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Keygen { secret } => keygen(secret.as_deref())?,
        Commands::Sign { secret, digest } => sign(&secret, &digest)?,
        Commands::Recover {
            digest,
            signature,
            layout,
        } => recover(
            &digest,
            &signature,
            layout.unwrap_or(config.registry.signature_layout),
        )?,
        Commands::Run { scenario } => run(&scenario, &config)?,
    }

    Ok(())
}

fn load_key(secret_hex: &str) -> Result<KeyPair> {
    let secret = decode_hex(secret_hex.trim()).context("Invalid secret key")?;
    KeyPair::from_secret_bytes(&secret)
}

fn keygen(secret: Option<&str>) -> Result<()> {
    let key_pair = match secret {
        Some(secret) => load_key(secret)?,
        None => KeyPair::generate(),
    };

    println!("secret:  0x{}", hex::encode(key_pair.secret_bytes()));
    println!("address: {}", key_pair.address());
    Ok(())
}

fn sign(secret: &str, digest: &str) -> Result<()> {
    let key_pair = load_key(secret)?;
    let digest = decode_digest(digest)?;
    let signature = key_pair.sign_digest(&digest)?;

    info!(signer = %key_pair.address(), "signed digest");
    println!("0x{}", hex::encode(signature));
    Ok(())
}

fn recover(digest: &str, signature: &str, layout: SignatureLayout) -> Result<()> {
    let digest = decode_digest(digest)?;
    let signature = decode_hex(signature)?;
    let signer = recover_signer(&digest, &signature, layout)?;

    if signer.is_zero() {
        tracing::warn!(%layout, "signature does not recover to any signer");
    }
    println!("{signer}");
    Ok(())
}

fn run(path: &Path, config: &AppConfig) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("Invalid scenario document")?;

    let registry = CertificateRegistry::with_config(MemoryStorage::new(), config.registry.clone());
    info!(steps = scenario.steps.len(), "running scenario");

    for report in run_scenario(&registry, &scenario) {
        println!("{}", serde_json::to_string(&report)?);
    }

    let events = registry.events()?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
