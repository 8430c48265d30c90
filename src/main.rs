use clap::{error::ErrorKind, Parser};
use sales_summary::{Config, Error};
use std::{ffi::OsString, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Aggregate branch and commodity sales totals from a directory of sales files."
)]
struct Cli {
    /// Directory holding branch.lst, commodity.lst and the NNNNNNNN.rcd sales files.
    #[arg(allow_hyphen_values = true)]
    directory: PathBuf,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // one line, whatever went wrong
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), anyhow::Error> {
    init_logging()?;
    let Some(cli) = parse_args(std::env::args_os())? else {
        return Ok(());
    };
    sales_summary::run(&Config::new(cli.directory))?;
    Ok(())
}

/// `Ok(None)` when clap already printed help or version. Anything but exactly
/// one directory argument is an argument count error.
fn parse_args<I, T>(args: I) -> Result<Option<Cli>, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => {
                debug!(%err, "rejected command line");
                Err(Error::ArgumentCount)
            }
        },
    }
}

/// Logs go to stderr, quiet unless `RUST_LOG` asks for more.
fn init_logging() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}
