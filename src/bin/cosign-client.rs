//! Client side of two-party RSA co-signing.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rsa_cosign::cli::{generate_interactive, init_logging, run_self_test};
use rsa_cosign::config::RSA_MODULUS_BITS;
use rsa_cosign::rand_core::OsRng;
use rsa_cosign::{
    parse_uint, Channel, Client, FileChannel, MessageRecord, Party, ProtocolConfig, SelfTest,
};
use sha2::Sha256;
use tracing::info;

/// Holds the client modulus and one share of its private exponent.
#[derive(Parser)]
#[command(name = "cosign-client")]
#[command(about = "Client party of two-party RSA co-signing")]
#[command(version)]
struct Cli {
    /// Directory shared with the server
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Bit length of each sub-modulus
    #[arg(short, long, default_value_t = RSA_MODULUS_BITS)]
    bits: usize,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the client modulus and split its private exponent
    Generate {
        /// Replace existing keys without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Compute the client's partial signature of message.txt
    Sign {
        /// Hexadecimal message to write to message.txt first
        #[arg(short, long, conflicts_with = "hash")]
        message: Option<String>,

        /// File whose SHA-256 digest becomes the message
        #[arg(long)]
        hash: Option<PathBuf>,
    },

    /// Verify final.sig against public_key.key
    Verify,

    /// Run the self-test
    Test {
        /// Number of iterations
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("NOK");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("NOK: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = ProtocolConfig::default().with_modulus_bits(cli.bits)?;
    let client = Client::new(config.clone());
    let mut channel = FileChannel::open(&cli.dir)
        .with_context(|| format!("cannot open {}", cli.dir.display()))?;

    match cli.command {
        Commands::Generate { force } => {
            let stdin = io::stdin();
            let generated = generate_interactive(
                &client,
                &mut channel,
                &mut OsRng,
                force,
                &mut stdin.lock(),
                &mut io::stdout(),
            )?;
            if !generated {
                info!("existing client keys left untouched");
            }
        }
        Commands::Sign { message, hash } => {
            if let Some(hex) = message {
                let m = parse_uint(&hex)
                    .ok_or_else(|| anyhow!("{:?} is not a hexadecimal integer", hex))?;
                channel.send(&MessageRecord::new(m))?;
            } else if let Some(path) = hash {
                let data = std::fs::read(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                channel.send(&MessageRecord::from_digest::<Sha256>(&data))?;
            }
            client.sign(&mut channel)?;
        }
        Commands::Verify => client.verify(&mut channel)?,
        Commands::Test { iterations } => {
            let config = match iterations {
                Some(n) => config.with_test_iterations(n),
                None => config,
            };
            let test = SelfTest::new(config)?;
            let report = run_self_test(&test, &mut OsRng, &mut io::stdout());
            return Ok(report.passed());
        }
    }

    Ok(true)
}
