//! Filename templates and the catalog of named rename formats.
//!
//! A template is plain text with `{field}` placeholders. `{season:02}`
//! zero-pads to the given width. Text inside `[...]` is only emitted when
//! every placeholder in it has a value, so `{title}[ ({year})]{ext}` renders
//! as `Heat (1995).mkv` or just `Heat.mkv`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, TemplateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    #[default]
    Movie,
    Tv,
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaMode::Movie => "movie",
            MediaMode::Tv => "tv",
        })
    }
}

impl FromStr for MediaMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaMode::Movie),
            "tv" | "show" | "series" => Ok(MediaMode::Tv),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Year,
    EpisodeTitle,
    Season,
    Episode,
    Ext,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "title" => Field::Title,
            "year" => Field::Year,
            "episode_title" => Field::EpisodeTitle,
            "season" => Field::Season,
            "episode" => Field::Episode,
            "ext" => Field::Ext,
            _ => return None,
        })
    }
}

/// Values available to a template. Titles are expected to be sanitized already.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    pub title: String,
    pub year: Option<u16>,
    pub episode_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub extension: String,
}

impl NameContext {
    fn value(&self, field: Field, width: usize) -> Option<String> {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let number = |n: Option<u32>| n.map(|n| format!("{n:0width$}"));
        match field {
            Field::Title => text(&self.title),
            Field::Year => self.year.map(|y| y.to_string()),
            Field::EpisodeTitle => self.episode_title.as_deref().and_then(text),
            Field::Season => number(self.season),
            Field::Episode => number(self.episode),
            Field::Ext => Some(self.extension.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { field: Field, width: usize },
    Optional(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        // stack of open groups; the bottom entry is the top level
        let mut groups: Vec<Vec<Segment>> = vec![Vec::new()];
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(TemplateError::Unclosed('{')),
                        }
                    }
                    flush(&mut literal, &mut groups);
                    let segment = parse_field(&name)?;
                    push(&mut groups, segment);
                }
                '[' => {
                    flush(&mut literal, &mut groups);
                    groups.push(Vec::new());
                }
                ']' => {
                    if groups.len() < 2 {
                        return Err(TemplateError::Unexpected(']'));
                    }
                    flush(&mut literal, &mut groups);
                    let inner = groups.pop().unwrap_or_default();
                    push(&mut groups, Segment::Optional(inner));
                }
                '}' => return Err(TemplateError::Unexpected('}')),
                other => literal.push(other),
            }
        }

        flush(&mut literal, &mut groups);
        if groups.len() > 1 {
            return Err(TemplateError::Unclosed('['));
        }

        Ok(Self {
            source: source.to_string(),
            segments: groups.pop().unwrap_or_default(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Missing values render as nothing at the top level and suppress the
    /// enclosing `[...]` group otherwise.
    pub fn render(&self, context: &NameContext) -> String {
        render_segments(&self.segments, context, false).unwrap_or_default()
    }
}

fn parse_field(placeholder: &str) -> Result<Segment, TemplateError> {
    let (name, width) = match placeholder.split_once(':') {
        Some((name, width)) => {
            let width = width
                .parse::<usize>()
                .map_err(|_| TemplateError::BadWidth(placeholder.to_string()))?;
            (name.trim(), width)
        }
        None => (placeholder.trim(), 0),
    };
    let field = Field::parse(name).ok_or_else(|| TemplateError::UnknownField(name.to_string()))?;
    Ok(Segment::Field { field, width })
}

fn flush(literal: &mut String, groups: &mut [Vec<Segment>]) {
    if !literal.is_empty() {
        let text = std::mem::take(literal);
        if let Some(current) = groups.last_mut() {
            current.push(Segment::Literal(text));
        }
    }
}

fn push(groups: &mut [Vec<Segment>], segment: Segment) {
    if let Some(current) = groups.last_mut() {
        current.push(segment);
    }
}

fn render_segments(segments: &[Segment], context: &NameContext, strict: bool) -> Option<String> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field { field, width } => match context.value(*field, *width) {
                Some(value) => out.push_str(&value),
                None if strict => return None,
                None => {}
            },
            Segment::Optional(inner) => {
                if let Some(rendered) = render_segments(inner, context, true) {
                    out.push_str(&rendered);
                }
            }
        }
    }
    Some(out)
}

/// A named, selectable output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFormat {
    pub key: String,
    pub label: String,
    template: Template,
    modes: Vec<MediaMode>,
}

impl RenameFormat {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        template: &str,
        modes: &[MediaMode],
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            key: key.into(),
            label: label.into(),
            template: Template::parse(template)?,
            modes: modes.to_vec(),
        })
    }

    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    pub fn supports(&self, mode: MediaMode) -> bool {
        self.modes.contains(&mode)
    }

    /// Full file name (stem and extension) for `context`.
    pub fn file_name(&self, context: &NameContext) -> String {
        let rendered = collapse_whitespace(&self.template.render(context));
        let stem = rendered
            .strip_suffix(context.extension.as_str())
            .unwrap_or(&rendered)
            .trim();
        if stem.is_empty() {
            return format!("{}{}", context.title, context.extension);
        }
        rendered
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub const DEFAULT_MOVIE_FORMAT: &str = "movie_title_year";
pub const DEFAULT_TV_FORMAT: &str = "show_episode_numbers";

const BUILTIN_FORMATS: &[(&str, &str, &str, MediaMode)] = &[
    ("movie_title_year", "Movie Title (Year)", "{title}[ ({year})]{ext}", MediaMode::Movie),
    ("movie_title", "Movie Title", "{title}{ext}", MediaMode::Movie),
    (
        "show_episode_numbers",
        "TV Show Name - Episode Name - S##E##",
        "{title}[ - {episode_title}][ - S{season:02}E{episode:02}]{ext}",
        MediaMode::Tv,
    ),
    (
        "show_numbers",
        "TV Show Name - S##E##",
        "{title}[ - S{season:02}E{episode:02}]{ext}",
        MediaMode::Tv,
    ),
    ("show_episode", "TV Show Name - Episode Name", "{title}[ - {episode_title}]{ext}", MediaMode::Tv),
    ("show_only", "TV Show Name", "{title}{ext}", MediaMode::Tv),
];

/// Every format the user can pick from, built-ins first.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalog {
    formats: Vec<RenameFormat>,
}

impl FormatCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        for (key, label, template, mode) in BUILTIN_FORMATS {
            let format = RenameFormat::new(*key, *label, template, &[*mode]).map_err(|source| {
                ConfigError::Template {
                    key: key.to_string(),
                    source,
                }
            })?;
            catalog.insert(format);
        }
        Ok(catalog)
    }

    /// Add a format, replacing any existing one with the same key.
    pub fn insert(&mut self, format: RenameFormat) {
        match self.formats.iter_mut().find(|f| f.key == format.key) {
            Some(existing) => *existing = format,
            None => self.formats.push(format),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RenameFormat> {
        self.formats.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenameFormat> {
        self.formats.iter()
    }

    pub fn for_mode(&self, mode: MediaMode) -> impl Iterator<Item = &RenameFormat> {
        self.formats.iter().filter(move |f| f.supports(mode))
    }

    /// Look up `key` (or the mode's default) and check it fits `mode`.
    pub fn resolve(&self, key: Option<&str>, mode: MediaMode) -> Result<RenameFormat, ConfigError> {
        let key = key.unwrap_or(match mode {
            MediaMode::Movie => DEFAULT_MOVIE_FORMAT,
            MediaMode::Tv => DEFAULT_TV_FORMAT,
        });
        let format = self.get(key).ok_or_else(|| ConfigError::UnknownFormat {
            key: key.to_string(),
            available: self.formats.iter().map(|f| f.key.as_str()).collect::<Vec<_>>().join(", "),
        })?;
        if !format.supports(mode) {
            return Err(ConfigError::FormatModeMismatch {
                key: key.to_string(),
                mode: mode.to_string(),
            });
        }
        Ok(format.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode_context() -> NameContext {
        NameContext {
            title: "The Expanse".into(),
            year: Some(2015),
            episode_title: Some("Static".into()),
            season: Some(2),
            episode: Some(3),
            extension: ".mkv".into(),
        }
    }

    fn render(key: &str, context: &NameContext) -> String {
        FormatCatalog::builtin().unwrap().get(key).unwrap().file_name(context)
    }

    #[test]
    fn builtin_tv_formats() {
        let ctx = episode_context();
        assert_eq!(render("show_episode_numbers", &ctx), "The Expanse - Static - S02E03.mkv");
        assert_eq!(render("show_numbers", &ctx), "The Expanse - S02E03.mkv");
        assert_eq!(render("show_episode", &ctx), "The Expanse - Static.mkv");
        assert_eq!(render("show_only", &ctx), "The Expanse.mkv");
    }

    #[test]
    fn optional_groups_vanish_without_values() {
        let ctx = NameContext {
            title: "The Matrix".into(),
            extension: ".mkv".into(),
            ..NameContext::default()
        };
        assert_eq!(render("movie_title_year", &ctx), "The Matrix.mkv");
        assert_eq!(render("show_episode_numbers", &ctx), "The Matrix.mkv");
    }

    #[test]
    fn padded_numbers_without_groups() {
        let format = RenameFormat::new(
            "custom",
            "Custom",
            "{title} - S{season:02}E{episode:02}{ext}",
            &[MediaMode::Tv],
        )
        .unwrap();
        assert_eq!(format.file_name(&episode_context()), "The Expanse - S02E03.mkv");
    }

    #[test]
    fn empty_render_falls_back_to_title() {
        let format = RenameFormat::new("odd", "Odd", "[{episode_title}]{ext}", &[MediaMode::Movie]).unwrap();
        let ctx = NameContext {
            title: "Heat".into(),
            extension: ".avi".into(),
            ..NameContext::default()
        };
        assert_eq!(format.file_name(&ctx), "Heat.avi");
    }

    #[test]
    fn template_errors() {
        assert_eq!(Template::parse("{nope}").unwrap_err(), TemplateError::UnknownField("nope".into()));
        assert_eq!(Template::parse("{title").unwrap_err(), TemplateError::Unclosed('{'));
        assert_eq!(Template::parse("[{year}").unwrap_err(), TemplateError::Unclosed('['));
        assert_eq!(Template::parse("x]").unwrap_err(), TemplateError::Unexpected(']'));
        assert!(matches!(Template::parse("{season:xx}"), Err(TemplateError::BadWidth(_))));
    }

    #[test]
    fn resolve_checks_mode() {
        let catalog = FormatCatalog::builtin().unwrap();
        assert_eq!(catalog.resolve(None, MediaMode::Movie).unwrap().key, "movie_title_year");
        assert_eq!(catalog.resolve(None, MediaMode::Tv).unwrap().key, "show_episode_numbers");
        assert!(matches!(
            catalog.resolve(Some("show_only"), MediaMode::Movie),
            Err(ConfigError::FormatModeMismatch { .. })
        ));
        assert!(matches!(
            catalog.resolve(Some("bogus"), MediaMode::Movie),
            Err(ConfigError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("TV".parse::<MediaMode>().unwrap(), MediaMode::Tv);
        assert_eq!("movie".parse::<MediaMode>().unwrap(), MediaMode::Movie);
        assert!("anime".parse::<MediaMode>().is_err());
    }
}
