//! CLI argument definitions for the batch converter.

use std::path::PathBuf;

use bids_cli::config::{MatchingOverrides, PathOverrides};
use bids_cli::logging::{LogFormat, LogLevel};
use bids_model::{ColumnOrder, MatchStrategy};
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dicom2bids-batch",
    version,
    about = "Batch-convert DICOM studies into a BIDS archive",
    long_about = "Batch-convert DICOM study folders into a BIDS archive.\n\n\
                  Folders are matched to pseudonymized subject IDs through a mapping \
                  spreadsheet, converted with dcm2bids, defaced with pydeface, and \
                  physiological recordings are extracted with physio2bidsphysio."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file for this pass (default depends on the subcommand).
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// TOML configuration file; flags override its values.
    #[arg(
        long = "config",
        value_name = "PATH",
        env = "DICOM2BIDS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert every matched subject folder with dcm2bids and pydeface.
    Convert(ConvertArgs),

    /// Extract physiological recordings into each subject's func directory.
    ///
    /// Runs as a dry run unless --execute is given.
    Physio(PhysioArgs),

    /// Load the mapping table and print it.
    Mapping(MappingArgs),
}

#[derive(Args)]
pub struct PathArgs {
    /// Root folder with one DICOM folder per subject.
    #[arg(long = "dicom-dir", value_name = "DIR")]
    pub dicom_dir: Option<PathBuf>,

    /// Root of the BIDS archive.
    #[arg(long = "bids-dir", value_name = "DIR")]
    pub bids_dir: Option<PathBuf>,

    /// Mapping spreadsheet (.xlsx, .xls, .ods, .csv, .tsv).
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Session label, without the "ses-" prefix.
    #[arg(long = "session", value_name = "LABEL")]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct MatchingArgs {
    /// How raw IDs are located in folder and file names.
    #[arg(long = "match-strategy", value_name = "STRATEGY")]
    pub match_strategy: Option<MatchStrategy>,

    /// Skip names that match more than one mapping row.
    #[arg(long = "reject-ambiguous")]
    pub reject_ambiguous: bool,
}

impl MatchingArgs {
    pub fn overrides(&self, column_order: Option<ColumnOrder>) -> MatchingOverrides {
        MatchingOverrides {
            strategy: self.match_strategy,
            reject_ambiguous: self.reject_ambiguous,
            column_order,
        }
    }
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// dcm2bids JSON configuration, passed through unchanged.
    #[arg(long = "dcm2bids-config", value_name = "PATH")]
    pub dcm2bids_config: Option<PathBuf>,

    #[command(flatten)]
    pub matching: MatchingArgs,

    /// Which of the first two mapping columns holds the raw ID.
    #[arg(long = "column-order", value_name = "ORDER")]
    pub column_order: Option<ColumnOrder>,

    /// Skip pydeface.
    #[arg(long = "no-deface")]
    pub no_deface: bool,

    /// Write a per-subject run report (.json or .csv).
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl ConvertArgs {
    pub fn path_overrides(&self) -> PathOverrides {
        PathOverrides {
            dicom_dir: self.paths.dicom_dir.clone(),
            bids_dir: self.paths.bids_dir.clone(),
            dcm2bids_config: self.dcm2bids_config.clone(),
            mapping: self.paths.mapping.clone(),
            session: self.paths.session.clone(),
        }
    }
}

#[derive(Args)]
pub struct PhysioArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(flatten)]
    pub matching: MatchingArgs,

    /// Run physio2bidsphysio instead of only listing the candidates.
    #[arg(long = "execute")]
    pub execute: bool,
}

impl PhysioArgs {
    pub fn path_overrides(&self) -> PathOverrides {
        PathOverrides {
            dicom_dir: self.paths.dicom_dir.clone(),
            bids_dir: self.paths.bids_dir.clone(),
            dcm2bids_config: None,
            mapping: self.paths.mapping.clone(),
            session: self.paths.session.clone(),
        }
    }
}

#[derive(Args)]
pub struct MappingArgs {
    /// Mapping spreadsheet (defaults to [paths] mapping in the config file).
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Require the RawID and AnonymizedID headers, as the physio pass does.
    #[arg(long = "named")]
    pub named: bool,

    /// Which of the first two columns holds the raw ID.
    #[arg(long = "column-order", value_name = "ORDER", conflicts_with = "named")]
    pub column_order: Option<ColumnOrder>,
}
