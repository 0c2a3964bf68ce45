mod commands;
mod helpers;

use cellfit_core::domain::CellfitError;
use clap::Parser;

pub fn run_from_env() -> i32 {
    helpers::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let cellfit_error = error.as_cellfit_error();
            eprintln!("{}", cellfit_error.diagnostic_line());
            eprintln!("{}", cellfit_error.fatal_exit_line());
            cellfit_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("cellfit".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "cellfit",
    version,
    about = "Decode neuron fit parameters and apply them to a cell decoration"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Decode a fit parameter file into passive, mechanism and ion sets
    Decode(commands::DecodeArgs),
    /// Decode a fit parameter file and apply it to a recorded decoration
    Decorate(commands::DecorateArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Decode(args) => commands::run_decode_command(args),
        CliCommand::Decorate(args) => commands::run_decorate_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Run(CellfitError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_cellfit_error(&self) -> CellfitError {
        match self {
            Self::Usage(message) => {
                CellfitError::input_validation("INPUT.CLI_USAGE", message.trim_end())
            }
            Self::Run(error) => error.clone(),
            Self::Internal(error) => CellfitError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};

    #[test]
    fn help_exits_successfully() {
        assert_eq!(run(["--help"]).expect("help should succeed"), 0);
        assert_eq!(run(["decode", "--help"]).expect("help should succeed"), 0);
    }

    #[test]
    fn unknown_subcommand_is_usage_error() {
        let error = run(["simulate"]).expect_err("unknown command should fail");
        assert!(matches!(error, CliError::Usage(_)));
        let cellfit_error = error.as_cellfit_error();
        assert_eq!(cellfit_error.placeholder(), "INPUT.CLI_USAGE");
        assert_eq!(cellfit_error.exit_code(), 2);
    }

    #[test]
    fn run_errors_keep_their_placeholder() {
        let error = run(["decode", "/nonexistent/fit_parameters.json"])
            .expect_err("missing file should fail");
        let cellfit_error = error.as_cellfit_error();
        assert_eq!(cellfit_error.placeholder(), "IO.FIT_READ");
        assert_eq!(cellfit_error.exit_code(), 3);
    }
}
