//! `polcmp inspect` - parse a single source and report what it contains.

use std::path::PathBuf;

use clap::Subcommand;
use polcmp_recon::reference::parse_reference_file;
use polcmp_recon::variational::{load_variational, DEFAULT_COMMENT_PREFIX, DEFAULT_PATTERN};
use polcmp_recon::{ParseOutcome, PolarizationKey, DEFAULT_LATTICE_SITES};
use serde::Serialize;

use crate::{CliError, StrategyArg};

#[derive(Subcommand)]
pub enum InspectCommands {
    /// Parse a DMRG reference file
    #[command(after_help = "\
Examples:
  polcmp inspect reference ferU-4.txt
  polcmp inspect reference n1.5U-10.txt --strategy paired --json")]
    Reference {
        /// DMRG reference file
        file: PathBuf,

        /// Reference stream pairing strategy
        #[arg(long, value_enum, default_value = "forward")]
        strategy: StrategyArg,

        /// Expected lattice size
        #[arg(long, default_value_t = DEFAULT_LATTICE_SITES)]
        sites: usize,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse every TFA file matching a glob
    #[command(after_help = "\
Examples:
  polcmp inspect variational
  polcmp inspect variational --pattern 'runs/tfa_output_Nup*.txt' --json")]
    Variational {
        /// Glob matching the TFA output files
        #[arg(long, value_name = "GLOB", default_value = DEFAULT_PATTERN)]
        pattern: String,

        /// Lines starting with this prefix are skipped
        #[arg(long, default_value = DEFAULT_COMMENT_PREFIX)]
        comment_prefix: String,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

/// One key's vector lengths.
#[derive(Debug, Serialize, PartialEq)]
struct KeyListing {
    key: PolarizationKey,
    density: usize,
    magnetization: usize,
}

fn listings(outcome: &ParseOutcome) -> Vec<KeyListing> {
    outcome
        .dataset
        .iter()
        .map(|(key, pair)| KeyListing {
            key,
            density: pair.density.len(),
            magnetization: pair.magnetization.len(),
        })
        .collect()
}

pub fn cmd_inspect(cmd: InspectCommands) -> Result<(), CliError> {
    let (outcome, json) = match cmd {
        InspectCommands::Reference { file, strategy, sites, json } => {
            if sites == 0 {
                return Err(CliError::args("--sites must be at least 1"));
            }
            (parse_reference_file(&file, strategy.into(), sites)?, json)
        }
        InspectCommands::Variational { pattern, comment_prefix, json } => {
            if comment_prefix.is_empty() {
                return Err(CliError::args("--comment-prefix must not be empty"));
            }
            (load_variational(&pattern, &comment_prefix)?, json)
        }
    };

    for diagnostic in &outcome.diagnostics {
        eprintln!("{diagnostic}");
    }

    let rows = listings(&outcome);
    if json {
        let json_str = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for row in &rows {
            println!("pol={}\tdensity={}\tmagnetization={}", row.key, row.density, row.magnetization);
        }
    }

    eprintln!(
        "{} {} key(s), {} diagnostic(s)",
        outcome.dataset.source().label(),
        rows.len(),
        outcome.diagnostics.len(),
    );
    Ok(())
}
