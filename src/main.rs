mod cli;

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use tracing::error;

use deebee::pipeline::BatchReport;
use deebee::presenter::status_line;
use deebee::rename_engine::{ExecutionMode, MediaMode};
use deebee::tui::TuiPresenter;
use deebee::{
    CancelToken, ConfigBuilder, ConsolePresenter, FileConfig, ImdbClient, LinePresenter, Pipeline,
    Presenter,
};

/// Exit status for authentication, configuration and scan errors.
const FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_file = init_logging(&cli);

    let outcome = run(cli);
    if let Some(path) = log_file {
        println!("ℹ Log written to {}", path.display());
    }
    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            eprintln!("✗ Error: {err:#}");
            ExitCode::from(FATAL)
        }
    }
}

/// Logs go to stderr, or to a file when one is asked for or the terminal
/// interface owns the screen. Returns the file in use.
fn init_logging(cli: &Cli) -> Option<PathBuf> {
    // RUST_LOG wins; otherwise -v/-vv raise the crate's level
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "deebee=warn",
            1 => "deebee=debug",
            _ => "deebee=trace",
        }
        .to_string()
    });
    let subscriber = tracing_subscriber::fmt().with_env_filter(&env_filter);

    let Some(path) = cli.log_file() else {
        subscriber.with_writer(io::stderr).init();
        return None;
    };
    match File::create(&path) {
        Ok(file) => {
            subscriber.with_writer(Mutex::new(file)).with_ansi(false).init();
            Some(path)
        }
        Err(err) => {
            eprintln!("⚠ Could not open log file {}: {err}", path.display());
            subscriber.with_writer(io::sink).init();
            None
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let mut builder = ConfigBuilder::new().directory(&cli.path);
    if let Some((_, file)) = FileConfig::discover(cli.config.as_deref())? {
        builder = builder.file(file);
    }
    let builder = builder
        .environment(|name| std::env::var(name).ok())
        .api_key(cli.api_key)
        .limit(cli.limit.map(usize::from))
        .mode(cli.mode.map(MediaMode::from))
        .format(cli.format)
        .execute(cli.execute)
        .recursive(cli.recursive);

    if cli.list_formats {
        let catalog = builder.catalog()?;
        for mode in [MediaMode::Movie, MediaMode::Tv] {
            println!("{mode} formats:");
            for format in catalog.for_mode(mode) {
                println!("  {:<22} {:<38} {}", format.key, format.label, format.template());
            }
        }
        return Ok(0);
    }

    let config = builder.build()?;
    let client = ImdbClient::new(config.client_settings())?;
    let cancel = CancelToken::new();

    if !cli.tui {
        println!("DeeBee");
        println!("===================");
        println!("Folder: {}", config.directory.display());
        println!("Format: {} ({})", config.format.label, config.format.template());
        if config.execution == ExecutionMode::DryRun {
            println!("ℹ Dry run: nothing will be renamed. Re-run with --execute to apply.");
        }
    }

    let presenter: Box<dyn Presenter> = if cli.tui {
        Box::new(
            TuiPresenter::new(config.execution, cancel.clone())
                .context("could not start the terminal interface")?,
        )
    } else {
        if io::stdin().is_terminal() {
            Box::new(ConsolePresenter::new(cancel.clone()))
        } else {
            Box::new(LinePresenter::stdio(cancel.clone()))
        }
    };

    let mut pipeline = Pipeline::new(
        client,
        presenter,
        config.format.clone(),
        config.pipeline_settings(),
        cancel,
    )?;
    let outcome = pipeline.run(&config.directory);
    // leave the alternate screen before printing anything
    drop(pipeline);
    let report = outcome?;

    if cli.tui {
        for result in &report.results {
            println!("{}", status_line(result));
        }
    }
    print_summary(&report, config.execution);
    if let Some(err) = &report.aborted {
        error!("{err}");
        eprintln!("✗ Error: {err}");
    }
    Ok(report.exit_code())
}

fn print_summary(report: &BatchReport, mode: ExecutionMode) {
    let summary = report.summary();
    let changed = match mode {
        ExecutionMode::DryRun => format!("{} would be renamed", summary.dry_run),
        ExecutionMode::Execute => format!("{} renamed", summary.applied),
    };

    println!();
    println!("===================");
    println!(
        "Summary: {} of {} files processed ({changed}, {} skipped, {} failed)",
        report.results.len(),
        report.total,
        summary.skipped,
        summary.failed
    );

    if report.cancelled {
        println!(
            "⚠ Stopped early; {} file(s) were not looked at.",
            report.total - report.results.len()
        );
    }
    if report.aborted.is_some() {
        println!(
            "⚠ Stopped by an error; {} file(s) were not looked at.",
            report.total - report.results.len()
        );
    }
    if summary.failed > 0 {
        println!("⚠ Some files could not be renamed.");
    } else if report.aborted.is_none() {
        if summary.applied + summary.dry_run > 0 {
            println!("✓ All selected files were handled.");
        } else {
            println!("ℹ Nothing to rename.");
        }
    }
}
