// polcmp CLI - DMRG vs TFA per-site observable comparison

mod compare;
mod exit_codes;
mod inspect;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use polcmp_recon::{ReconError, ReferenceStrategy};

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "polcmp")]
#[command(about = "Compare DMRG and TFA site-resolved density and magnetization profiles")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full comparison and write tables and plots
    #[command(after_help = "\
Examples:
  polcmp compare
  polcmp compare --config ferU-4.toml
  polcmp compare --reference n1.5U-10.txt --strategy paired
  polcmp compare --pattern 'runs/tfa_output_Nup*.txt' --no-plots --json")]
    Compare(compare::CompareArgs),

    /// Parse one source and list its keys without writing anything
    #[command(subcommand)]
    Inspect(inspect::InspectCommands),

    /// Load and validate a run config without running
    #[command(after_help = "\
Examples:
  polcmp validate ferU-4.toml")]
    Validate {
        /// Path to the run config (.toml)
        config: PathBuf,
    },
}

/// Reference stream pairing strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Density line first, magnetization follows anywhere later
    Forward,
    /// Magnetization line immediately followed by its density line
    Paired,
}

impl From<StrategyArg> for ReferenceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Forward => ReferenceStrategy::Forward,
            StrategyArg::Paired => ReferenceStrategy::Paired,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  polcmp-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  polcmp-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Inspect(cmd) => inspect::cmd_inspect(cmd),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::NoCommonPolarizations { variational_keys: 0, .. } => {
                Some("no TFA file produced a key; check --pattern and the [variational] section")
            }
            ReconError::NoCommonPolarizations { reference_keys: 0, .. } => {
                Some("no DMRG key was parsed; try the other --strategy")
            }
            _ => None,
        };
        let cli = Self::new(code, err.to_string());
        match hint {
            Some(h) => cli.with_hint(h),
            None => cli,
        }
    }
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = polcmp_recon::RunConfig::from_file(&config_path)?;
    eprintln!("config OK: {}", config_path.display());
    eprintln!("  name:       {}", config.name);
    eprintln!("  reference:  {} ({})", config.reference.file.display(), config.reference.strategy);
    eprintln!("  pattern:    {}", config.variational.pattern);
    eprintln!("  sites:      {}", config.lattice.sites);
    eprintln!(
        "  outputs:    plots {} -> {}, tables {} -> {}",
        on_off(config.output.plots),
        config.output.plots_dir.display(),
        on_off(config.output.tables),
        config.output.tables_dir.display(),
    );
    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
