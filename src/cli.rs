use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Log file used with `--tui` when no `--log-file` is given.
pub const TUI_LOG_FILE: &str = "deebee.log";

use deebee::rename_engine::MediaMode;

#[derive(Parser, Debug)]
#[command(name = "deebee")]
#[command(author, version, about = "Rename movie and TV files using imdbapi.dev metadata")]
pub struct Cli {
    /// Folder with the media files to rename
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Apply the renames (default is a dry run)
    #[arg(long)]
    pub execute: bool,

    /// Maximum number of matches offered per file
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub limit: Option<u16>,

    /// Rename format key (see --list-formats)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Print the available rename formats and exit
    #[arg(long)]
    pub list_formats: bool,

    /// Kind of media in the folder
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Descend into subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Path to config file (defaults to ./deebee.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API key, overriding DEEBEE_API_KEY and the config file
    #[arg(long)]
    pub api_key: Option<String>,

    /// Use the full-screen terminal interface
    #[arg(long)]
    pub tui: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Where logs should go instead of stderr. The terminal interface
    /// draws over stderr, so it logs to the temp directory by default.
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(path.clone()),
            None if self.tui => Some(std::env::temp_dir().join(TUI_LOG_FILE)),
            None => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Movie,
    Tv,
}

impl From<ModeArg> for MediaMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Movie => MediaMode::Movie,
            ModeArg::Tv => MediaMode::Tv,
        }
    }
}
