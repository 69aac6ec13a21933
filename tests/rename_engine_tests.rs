// Integration tests for the rename engine module

use std::fs;
use std::path::PathBuf;

use deebee::metadata::{MatchResult, MediaKind};
use deebee::ranker::Choice;
use deebee::rename_engine::{
    ExecutionMode, ExecutionStatus, Executor, FormatCatalog, MediaMode, NameContext,
    RenameFormat, RenamePlanner, sanitize_filename,
};
use deebee::title_extractor::{EpisodeMarker, ScanCandidate};

fn candidate(path: PathBuf, title: &str, episode: Option<EpisodeMarker>) -> ScanCandidate {
    ScanCandidate {
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
        path,
        title: title.into(),
        year: None,
        episode,
    }
}

fn found(title: &str, year: Option<u16>, episode_title: Option<&str>) -> MatchResult {
    MatchResult {
        id: "tt0000001".into(),
        title: title.into(),
        year,
        kind: MediaKind::Movie,
        relevance: 1.0,
        episode_title: episode_title.map(str::to_string),
    }
}

#[test]
fn test_sanitize_filename() {
    assert_eq!(sanitize_filename("Test: File/Name"), "Test FileName");
    assert_eq!(sanitize_filename("Normal_File.Name"), "Normal_File.Name");
    assert_eq!(sanitize_filename("  Star   Wars <Special> "), "Star Wars Special");
}

#[test]
fn test_builtin_catalog_lists_both_modes() {
    let catalog = FormatCatalog::builtin().unwrap();
    let movie: Vec<&str> = catalog.for_mode(MediaMode::Movie).map(|f| f.key.as_str()).collect();
    let tv: Vec<&str> = catalog.for_mode(MediaMode::Tv).map(|f| f.key.as_str()).collect();
    assert_eq!(movie, ["movie_title_year", "movie_title"]);
    assert_eq!(
        tv,
        ["show_episode_numbers", "show_numbers", "show_episode", "show_only"]
    );
}

#[test]
fn test_custom_format_replaces_builtin_with_same_key() {
    let mut catalog = FormatCatalog::builtin().unwrap();
    let custom = RenameFormat::new("movie_title", "Title Year", "{title} [{year}]{ext}", &[MediaMode::Movie]);
    // "[{year}]" is an optional group, so the brackets themselves are not printed
    catalog.insert(custom.unwrap());
    let format = catalog.get("movie_title").unwrap();
    let name = format.file_name(&NameContext {
        title: "Heat".into(),
        year: Some(1995),
        extension: ".mkv".into(),
        ..NameContext::default()
    });
    assert_eq!(name, "Heat 1995.mkv");
    assert_eq!(catalog.iter().count(), 6);
}

#[test]
fn test_plan_and_execute_movie() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("heat.1995.1080p.mkv");
    fs::write(&source, b"movie").unwrap();

    let catalog = FormatCatalog::builtin().unwrap();
    let mut planner = RenamePlanner::new(catalog.resolve(None, MediaMode::Movie).unwrap());
    let selection = found("Heat", Some(1995), None);
    let plan = planner.plan(&candidate(source.clone(), "heat", None), Choice::Match(&selection));
    assert_eq!(plan.target, dir.path().join("Heat (1995).mkv"));

    let result = Executor::new(ExecutionMode::Execute).execute(plan);
    assert_eq!(result.status, ExecutionStatus::Applied);
    assert!(!source.exists());
    assert_eq!(fs::read(dir.path().join("Heat (1995).mkv")).unwrap(), b"movie");
}

#[test]
fn test_plan_tv_episode_without_episode_title() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("show.s03e07.mkv");

    let catalog = FormatCatalog::builtin().unwrap();
    let mut planner = RenamePlanner::new(catalog.get("show_episode_numbers").unwrap().clone());
    let selection = found("Severance", Some(2022), None);
    let plan = planner.plan(
        &candidate(source, "show", Some(EpisodeMarker { season: 3, episode: 7 })),
        Choice::Match(&selection),
    );
    assert_eq!(plan.target, dir.path().join("Severance - S03E07.mkv"));
    assert_eq!(plan.selection.as_ref().map(|m| m.title.as_str()), Some("Severance"));
}

#[test]
fn test_skip_never_touches_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("keep.mkv");
    fs::write(&source, b"x").unwrap();

    let catalog = FormatCatalog::builtin().unwrap();
    let mut planner = RenamePlanner::new(catalog.get("movie_title").unwrap().clone());
    let plan = planner.plan(&candidate(source.clone(), "keep", None), Choice::Skip);
    assert_eq!(plan.source, plan.target);

    let result = Executor::new(ExecutionMode::Execute).execute(plan);
    assert_eq!(result.status, ExecutionStatus::Skipped);
    assert!(source.exists());
}

#[test]
fn test_collision_with_existing_file_is_avoided() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("alien.mkv");
    fs::write(&source, b"new").unwrap();
    fs::write(dir.path().join("Alien (1979).mkv"), b"old").unwrap();
    fs::write(dir.path().join("Alien (1979) (1).mkv"), b"older").unwrap();

    let catalog = FormatCatalog::builtin().unwrap();
    let mut planner = RenamePlanner::new(catalog.get("movie_title_year").unwrap().clone());
    let selection = found("Alien", Some(1979), None);
    let plan = planner.plan(&candidate(source, "alien", None), Choice::Match(&selection));

    assert_eq!(plan.target, dir.path().join("Alien (1979) (2).mkv"));
    assert!(plan.adjusted);

    Executor::new(ExecutionMode::Execute).execute(plan);
    assert_eq!(fs::read(dir.path().join("Alien (1979).mkv")).unwrap(), b"old");
    assert_eq!(fs::read(dir.path().join("Alien (1979) (2).mkv")).unwrap(), b"new");
}
