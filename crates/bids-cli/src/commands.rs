use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bids_cli::config::{BatchConfig, MatchingOverrides, PathOverrides};
use bids_cli::logging::{
    CONVERT_LOG_FILE, LogConfig, PHYSIO_DRY_RUN_LOG_FILE, PHYSIO_LOG_FILE, build_dispatch,
};
use bids_cli::report::{RunWindow, write_report};
use bids_cli::summary::{
    print_conversion_summary, print_mapping_table, print_physio_dry_run, print_physio_summary,
};
use bids_core::{ProcessRunner, run_conversion, run_physio_conversion, run_physio_dry_run};
use bids_ingest::{MappingColumns, load_mapping_table};
use chrono::Utc;
use clap::ColorChoice;
use tracing::{error, info_span};

use crate::cli::{Cli, ConvertArgs, MappingArgs, PhysioArgs};

/// Run the convert pass. Returns the process exit code.
pub fn run_convert(cli: &Cli, args: &ConvertArgs, config: &BatchConfig) -> Result<i32> {
    let options = config
        .convert_options(
            &args.path_overrides(),
            args.matching.overrides(args.column_order),
            args.no_deface,
        )
        .context("resolve convert settings")?;
    let log_config = log_config(cli, config, PathBuf::from(CONVERT_LOG_FILE));
    let dispatch = build_dispatch(&log_config).context("initialize logging")?;

    let started_at = Utc::now();
    let result = tracing::dispatcher::with_default(&dispatch, || {
        let span = info_span!(
            "convert",
            session = %options.layout.session,
            dicom_dir = %options.dicom_dir.display()
        );
        let _guard = span.enter();
        let mut runner = ProcessRunner;
        run_conversion(&options, &mut runner)
            .inspect_err(|e| error!(error = %e, "conversion pass aborted"))
    });
    let report = result.context("conversion pass")?;
    let window = RunWindow {
        started_at,
        finished_at: Utc::now(),
    };

    print_conversion_summary(&report, log_config.log_file.as_deref());
    if let Some(path) = &args.report {
        write_report(path, &report, window).context("export run report")?;
        println!("Report: {}", path.display());
    }
    Ok(exit_code(report.has_failures()))
}

/// Run the physio pass, as a dry run unless `--execute` was given.
pub fn run_physio(cli: &Cli, args: &PhysioArgs, config: &BatchConfig) -> Result<i32> {
    let options = config
        .physio_options(&args.path_overrides(), args.matching.overrides(None))
        .context("resolve physio settings")?;
    let default_log = options.layout.root().join(if args.execute {
        PHYSIO_LOG_FILE
    } else {
        PHYSIO_DRY_RUN_LOG_FILE
    });
    let log_config = log_config(cli, config, default_log);
    let dispatch = build_dispatch(&log_config).context("initialize logging")?;
    let log_file = log_config.log_file.as_deref();

    if !args.execute {
        if let Some(path) = log_file {
            println!("Dry run logging to: {}", path.display());
        }
        let scan = tracing::dispatcher::with_default(&dispatch, || {
            let _guard = info_span!("physio_dry_run").entered();
            run_physio_dry_run(&options).inspect_err(|e| error!(error = %e, "physio dry run aborted"))
        })
        .context("physio dry run")?;
        print_physio_dry_run(&scan, log_file);
        return Ok(0);
    }

    let report = tracing::dispatcher::with_default(&dispatch, || {
        let _guard = info_span!("physio").entered();
        let mut runner = ProcessRunner;
        run_physio_conversion(&options, &mut runner)
            .inspect_err(|e| error!(error = %e, "physio pass aborted"))
    })
    .context("physio pass")?;
    print_physio_summary(&report, log_file);
    Ok(exit_code(report.has_failures()))
}

/// Load the mapping table and print it.
pub fn run_mapping(args: &MappingArgs, config: &BatchConfig) -> Result<i32> {
    let path = config
        .mapping_file(&PathOverrides {
            mapping: args.mapping.clone(),
            ..PathOverrides::default()
        })
        .context("resolve mapping path")?;
    let columns = if args.named {
        MappingColumns::Named
    } else {
        MappingColumns::Positional(config.column_order(MatchingOverrides {
            column_order: args.column_order,
            ..Default::default()
        }))
    };
    let table = load_mapping_table(&path, columns)
        .with_context(|| format!("load mapping table {}", path.display()))?;
    print_mapping_table(&table);
    Ok(0)
}

/// Build the pass logging configuration with consistent precedence:
/// flags, then the config file, then defaults.
fn log_config(cli: &Cli, config: &BatchConfig, default_log_file: PathBuf) -> LogConfig {
    let mut log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    // A level in the config file only applies when no -v/-q flag was given.
    let file_level = config
        .logging
        .level
        .filter(|_| !cli.verbosity.is_present());
    let explicit_level = cli.log_level.or(file_level);
    log_config.use_env_filter = !(cli.verbosity.is_present() || explicit_level.is_some());
    if let Some(level) = explicit_level {
        log_config.level_filter = level.level_filter();
    }
    log_config.format = cli
        .log_format
        .or(config.logging.format)
        .unwrap_or_default();
    log_config.log_file = Some(
        cli.log_file
            .clone()
            .or_else(|| config.logging.file.clone())
            .unwrap_or(default_log_file),
    );
    log_config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };
    log_config
}

fn exit_code(has_failures: bool) -> i32 {
    if has_failures { 1 } else { 0 }
}
