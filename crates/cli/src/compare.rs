//! `polcmp compare` - parse both sources, reconcile, write tables and plots.

use std::path::PathBuf;

use clap::Args;
use polcmp_io::{prepare_output_dirs, ExportSink, PlotSink, TableSink};
use polcmp_recon::{load_inputs, KeyOutcome, PolarizationKey, RunConfig, Severity};

use crate::exit_codes::EXIT_EXPORT;
use crate::{CliError, StrategyArg};

#[derive(Args)]
pub struct CompareArgs {
    /// Run config (.toml); defaults apply when omitted
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// DMRG reference file
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Glob matching the TFA output files
    #[arg(long, value_name = "GLOB")]
    pattern: Option<String>,

    /// Reference stream pairing strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Expected lattice size
    #[arg(long)]
    sites: Option<usize>,

    /// Directory for SVG plots
    #[arg(long, value_name = "DIR")]
    plots_dir: Option<PathBuf>,

    /// Directory for CSV tables
    #[arg(long, value_name = "DIR")]
    tables_dir: Option<PathBuf>,

    /// Skip plot rendering
    #[arg(long)]
    no_plots: bool,

    /// Skip table output
    #[arg(long)]
    no_tables: bool,

    /// Print the run summary as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Write the JSON run summary to a file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Suppress per-key progress and notices
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl CompareArgs {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<RunConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(ref file) = self.reference {
            config.reference.file = file.clone();
        }
        if let Some(ref pattern) = self.pattern {
            config.variational.pattern = pattern.clone();
        }
        if let Some(strategy) = self.strategy {
            config.reference.strategy = strategy.into();
        }
        if let Some(sites) = self.sites {
            config.lattice.sites = sites;
        }
        if let Some(ref dir) = self.plots_dir {
            config.output.plots_dir = dir.clone();
        }
        if let Some(ref dir) = self.tables_dir {
            config.output.tables_dir = dir.clone();
        }
        if self.no_plots {
            config.output.plots = false;
        }
        if self.no_tables {
            config.output.tables = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// `[OK] polarization 0.50 processed`
fn ok_line(key: PolarizationKey) -> String {
    format!("[OK] polarization {:.2} processed", key.value())
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let config = args.resolve_config()?;
    if !config.output.plots && !config.output.tables && !args.json && args.output.is_none() {
        return Err(CliError::args("nothing to write: plots and tables are both disabled")
            .with_hint("drop --no-plots or --no-tables, or add --json for the summary alone"));
    }

    let input = load_inputs(&config)?;
    for diagnostic in input.diagnostics() {
        if args.quiet && diagnostic.severity() == Severity::Notice {
            continue;
        }
        eprintln!("{diagnostic}");
    }

    // Empty intersection stops here, before any directory exists.
    let reconciler = input.reconciler(config.lattice.sites)?;
    let mut summary = input.summary(&config, &reconciler);

    let mut sinks: Vec<Box<dyn ExportSink>> = Vec::new();
    let mut dirs = Vec::new();
    if config.output.plots {
        dirs.push(config.output.plots_dir.as_path());
        sinks.push(Box::new(PlotSink::new(&config.output.plots_dir)));
    }
    if config.output.tables {
        dirs.push(config.output.tables_dir.as_path());
        sinks.push(Box::new(TableSink::new(&config.output.tables_dir)));
    }
    prepare_output_dirs(dirs).map_err(|e| CliError::new(EXIT_EXPORT, e.to_string()))?;

    for outcome in reconciler.outcomes() {
        match outcome {
            KeyOutcome::Skipped(notice) => {
                eprintln!("{notice}");
                summary.record_skipped(notice);
            }
            KeyOutcome::Aligned(record) => {
                let mut written = Vec::new();
                let mut failed = false;
                for sink in sinks.iter_mut() {
                    match sink.export(&record) {
                        Ok(paths) => written.extend(paths),
                        Err(e) => {
                            eprintln!("[ERROR] export failed for pol={}: {e}", record.key);
                            summary.record_export_failure(record.key, e.to_string());
                            failed = true;
                        }
                    }
                }
                if failed {
                    // partial output still exists on disk, but the key is not aligned
                    summary.artifacts.extend(written);
                    continue;
                }
                if !args.quiet {
                    eprintln!("{}", ok_line(record.key));
                }
                summary.record_aligned(record.key, written);
            }
        }
    }

    if args.json || args.output.is_some() {
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_EXPORT, format!("cannot write output {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }

        if args.json {
            println!("{json_str}");
        }
    }

    eprintln!(
        "compared {} common polarization(s): {} aligned, {} skipped, {} artifact(s) written",
        summary.common.len(),
        summary.aligned.len(),
        summary.skipped.len(),
        summary.artifacts.len(),
    );

    if !summary.export_failures.is_empty() {
        return Err(CliError::new(
            EXIT_EXPORT,
            format!("{} export failure(s)", summary.export_failures.len()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: CompareArgs,
    }

    fn parse(argv: &[&str]) -> CompareArgs {
        Harness::parse_from(std::iter::once("polcmp").chain(argv.iter().copied())).args
    }

    #[test]
    fn ok_line_uses_two_decimals() {
        let key = PolarizationKey::from_value(0.5).unwrap();
        assert_eq!(ok_line(key), "[OK] polarization 0.50 processed");
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse(&[]).resolve_config().unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--reference", "n1.5U-10.txt",
            "--strategy", "paired",
            "--sites", "40",
            "--no-plots",
            "--tables-dir", "out",
        ])
        .resolve_config()
        .unwrap();
        assert_eq!(config.reference.file, PathBuf::from("n1.5U-10.txt"));
        assert_eq!(config.reference.strategy, polcmp_recon::ReferenceStrategy::Paired);
        assert_eq!(config.lattice.sites, 40);
        assert!(!config.output.plots);
        assert!(config.output.tables);
        assert_eq!(config.output.tables_dir, PathBuf::from("out"));
    }

    #[test]
    fn zero_sites_flag_is_invalid_config() {
        let err = parse(&["--sites", "0"]).resolve_config().unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
    }
}
