//! Cypher CLI
//!
//! Key generation and one-shot encrypted file transfer over TCP.

use clap::{Parser, Subcommand};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod session;

use config::{AesKeyMode, CliConfig};
use cypher_crypto::rsa::RsaKeyPair;

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
static SEND: Emoji<'_, '_> = Emoji("📤 ", "[SEND] ");
static RECV: Emoji<'_, '_> = Emoji("📥 ", "[RECV] ");
static KEY: Emoji<'_, '_> = Emoji("🔑 ", "[KEY] ");

/// Cypher - RSA/AES key generation and encrypted file transfer
#[derive(Parser)]
#[command(name = "cypher")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate key files
    Keygen {
        #[command(subcommand)]
        kind: KeygenKind,
    },

    /// Receive files, one session per connection
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:7878")]
        listen: String,

        /// Directory for received files (overrides the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Stop after this many connections
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Send a file to a listening peer
    Send {
        /// Peer address
        #[arg(short = 'a', long, default_value = "127.0.0.1:7878")]
        connect: String,

        /// File to send
        #[arg(short, long)]
        file: PathBuf,

        /// AES key generation mode (overrides the config)
        #[arg(long, value_enum)]
        aes_mode: Option<AesKeyMode>,
    },
}

#[derive(Subcommand)]
enum KeygenKind {
    /// RSA keypair as decimal key files
    Rsa {
        /// Bits per prime (overrides the config)
        #[arg(short, long)]
        bits: Option<u64>,

        /// Public key output
        #[arg(long, default_value = "pub.key")]
        public: PathBuf,

        /// Private key output
        #[arg(long, default_value = "prv.key")]
        private: PathBuf,
    },

    /// Raw 16-byte AES key file
    Aes {
        /// Output file
        #[arg(short, long, default_value = "aes.key")]
        output: PathBuf,

        /// AES key generation mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<AesKeyMode>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load config
    let config_path = cli.config.unwrap_or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_default(&config_path)?;

    match cli.command {
        Commands::Keygen { kind } => match kind {
            KeygenKind::Rsa {
                bits,
                public,
                private,
            } => {
                let bits = bits.unwrap_or(config.rsa_bits);
                keygen_rsa(bits, config.primality_rounds, &public, &private)?;
            }
            KeygenKind::Aes { output, mode } => {
                keygen_aes(mode.unwrap_or(config.aes_key_mode), &output)?;
            }
        },
        Commands::Serve {
            listen,
            output_dir,
            count,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            println!("{} Waiting for files on {}", RECV, style(&listen).cyan());
            let written = session::serve(listen.as_str(), config, count)?;
            for path in written {
                println!("{} Saved {}", CHECK, style(path.display()).green());
            }
        }
        Commands::Send {
            connect,
            file,
            aes_mode,
        } => {
            if let Some(mode) = aes_mode {
                config.aes_key_mode = mode;
            }
            println!("{} Sending {} to {}", SEND, file.display(), style(&connect).cyan());
            let report = session::send_file(&connect, &file, &config)?;
            println!(
                "{} Sent {} bytes (peer key {})",
                CHECK,
                report.bytes,
                style(&report.fingerprint).yellow()
            );
        }
    }

    Ok(())
}

fn keygen_rsa(
    bits: u64,
    rounds: u32,
    public: &Path,
    private: &Path,
) -> anyhow::Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Generating two {bits}-bit primes..."));
    pb.enable_steady_tick(Duration::from_millis(100));

    let pair = RsaKeyPair::generate_with(bits, rounds, &mut rand::rngs::OsRng);
    pb.finish_and_clear();
    let pair = pair?;

    pair.public.save(public)?;
    pair.private.save(private)?;
    info!(bits, "wrote RSA keypair");

    println!("{} RSA keypair created", CHECK);
    println!("  {} Public:  {}", KEY, style(public.display()).green());
    println!("  {} Private: {}", KEY, style(private.display()).green());
    println!(
        "  {} Modulus: {} bits, ends {}",
        KEY,
        pair.public.modulus().bits(),
        style(hex::encode(pair.public.fingerprint())).yellow()
    );
    Ok(())
}

fn keygen_aes(mode: AesKeyMode, output: &Path) -> anyhow::Result<()> {
    let key = session::session_key(mode)?;
    key.save(output)?;
    info!(?mode, "wrote AES key");
    println!("{} AES key written to {}", CHECK, style(output.display()).green());
    Ok(())
}
