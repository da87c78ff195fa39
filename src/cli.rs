//! Pieces shared by the `cosign-client` and `cosign-server` binaries.

use std::io::{self, BufRead, Write};

use rand_core::CryptoRngCore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::errors::Result;
use crate::party::Party;
use crate::selftest::{SelfTest, SelfTestReport};
use crate::traits::Channel;

/// Installs the `fmt` subscriber. `RUST_LOG` wins over the default level,
/// which is `debug` with `verbose` and `info` otherwise.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Asks whether to regenerate `what` until the answer is `y` or `n`.
/// End of input counts as `n`.
pub fn confirm_regenerate<I, O>(input: &mut I, output: &mut O, what: &str) -> io::Result<bool>
where
    I: BufRead,
    O: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "Do you want to regenerate {}? (y/n) ", what)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        match line.trim() {
            "y" | "Y" | "yes" => return Ok(true),
            "n" | "N" | "no" => return Ok(false),
            other => writeln!(output, "Unknown answer {:?}, please type y or n.", other)?,
        }
    }
}

/// Runs `party.generate` unless its keys exist and the user declines to
/// replace them. Returns whether new keys were written.
pub fn generate_interactive<P, C, R, I, O>(
    party: &P,
    channel: &mut C,
    rng: &mut R,
    force: bool,
    input: &mut I,
    output: &mut O,
) -> Result<bool>
where
    P: Party,
    C: Channel,
    R: CryptoRngCore + ?Sized,
    I: BufRead,
    O: Write,
{
    if !force && party.keys_exist(channel) {
        let what = format!("the {} keys", party.role());
        if !confirm_regenerate(input, output, &what)? {
            info!(role = %party.role(), "keeping existing keys");
            return Ok(false);
        }
    }

    party.generate(channel, rng)?;
    Ok(true)
}

/// Runs the self-test, printing one line per iteration to `output`.
pub fn run_self_test<R, O>(test: &SelfTest, rng: &mut R, output: &mut O) -> SelfTestReport
where
    R: CryptoRngCore + ?Sized,
    O: Write,
{
    test.run(rng, |i, result| {
        let status = if result.is_ok() { "OK" } else { "NOK" };
        let _ = writeln!(output, "TEST no. {}: {}", i + 1, status);
    })
}
