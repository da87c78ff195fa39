//! Server side of two-party RSA co-signing.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rsa_cosign::cli::{generate_interactive, init_logging, run_self_test};
use rsa_cosign::config::RSA_MODULUS_BITS;
use rsa_cosign::rand_core::OsRng;
use rsa_cosign::{FileChannel, Party, ProtocolConfig, SelfTest, Server};

/// Holds the server modulus with its whole exponent, and the server share of
/// the client exponent.
#[derive(Parser)]
#[command(name = "cosign-server")]
#[command(about = "Server party of two-party RSA co-signing")]
#[command(version)]
struct Cli {
    /// Directory shared with the client
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
    /// Generate the server key from for_server.key and publish the public key
    Generate {
        /// Replace existing keys without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Complete client.sig into final.sig
    Sign,

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
    let server = Server::new(config.clone());
    let mut channel = FileChannel::open(&cli.dir)
        .with_context(|| format!("cannot open {}", cli.dir.display()))?;

    match cli.command {
        Commands::Generate { force } => {
            let stdin = io::stdin();
            generate_interactive(
                &server,
                &mut channel,
                &mut OsRng,
                force,
                &mut stdin.lock(),
                &mut io::stdout(),
            )?;
        }
        Commands::Sign => server.sign(&mut channel)?,
        Commands::Verify => server.verify(&mut channel)?,
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
