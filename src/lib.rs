//! DeeBee: identify media files against imdbapi.dev and rename them.

pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod presenter;
pub mod ranker;
pub mod rename_engine;
pub mod scanner;
pub mod title_extractor;
pub mod tui;

pub use config::{AppConfig, ConfigBuilder, FileConfig};
pub use error::{ConfigError, LookupError, PipelineError, RenameFailure, TemplateError};
pub use metadata::{ImdbClient, MatchResult, MediaKind, MetadataSource};
pub use pipeline::{BatchReport, CancelToken, Pipeline, PipelineSettings, Summary};
pub use presenter::{ConsolePresenter, LinePresenter, Presenter};
pub use ranker::{Choice, ChoiceList};
pub use title_extractor::{ScanCandidate, TitleExtractor};
