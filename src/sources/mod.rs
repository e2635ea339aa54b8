//! Curriculum sources: hand-authored taxonomy bundles for reseeding.
//!
//! A curriculum source is a JSON document carrying a topic's metadata, its
//! nested taxonomy, and the per-level path-plan additions. Three sources are
//! bundled into the binary; more are discovered from a directory at runtime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::model::ExperienceLevel;
use crate::store::TopicDraft;
use crate::taxonomy::Taxonomy;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Where a curriculum source came from.
#[derive(Debug, Clone)]
pub enum SourceOrigin {
    /// Bundled into the binary via `include_str!`.
    Bundled,
    /// Loaded from an external file.
    External(PathBuf),
}

/// A parsed curriculum source, keyed by its topic slug.
#[derive(Debug, Clone)]
pub struct CurriculumSource {
    pub id: String,
    pub topic: TopicDraft,
    pub taxonomy: Taxonomy,
    /// Group-name prefixes *added* at each level. Levels are cumulative:
    /// a level sees every lower level's prefixes plus its own.
    pub level_additions: BTreeMap<ExperienceLevel, Vec<String>>,
    pub origin: SourceOrigin,
}

impl CurriculumSource {
    /// Load a source from a JSON file on disk.
    pub fn from_file(path: &Path) -> SourceResult<CurriculumSource> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        parse_source(&content, SourceOrigin::External(path.to_path_buf()))
    }

    /// The full (cumulative) prefix list visible at a level.
    pub fn prefixes_for_level(&self, level: ExperienceLevel) -> Vec<String> {
        let mut out = Vec::new();
        for candidate in ExperienceLevel::ALL {
            if let Some(additions) = self.level_additions.get(&candidate) {
                out.extend(additions.iter().cloned());
            }
            if candidate == level {
                break;
            }
        }
        out
    }

    /// Whether the source declares any path-plan additions at all.
    pub fn has_level_plan(&self) -> bool {
        self.level_additions.values().any(|v| !v.is_empty())
    }
}

// ── JSON deserialization helpers ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SourceJson {
    topic: TopicMeta,
    taxonomy: Value,
    #[serde(default)]
    levels: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TopicMeta {
    name: String,
    slug: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    color: String,
}

// ── Bundled sources ─────────────────────────────────────────────────────

const PYTHON_JSON: &str = include_str!("../../data/curricula/python.json");
const NETWORKING_JSON: &str = include_str!("../../data/curricula/networking.json");
const TYPESCRIPT_JSON: &str = include_str!("../../data/curricula/typescript.json");

fn parse_source(text: &str, origin: SourceOrigin) -> SourceResult<CurriculumSource> {
    let parsed: SourceJson = serde_json::from_str(text).map_err(|e| SourceError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;
    let id = parsed.topic.slug.clone();

    let taxonomy = Taxonomy::from_value(parsed.taxonomy).map_err(|e| SourceError::Parse {
        id: id.clone(),
        message: e.to_string(),
    })?;

    let mut level_additions = BTreeMap::new();
    for (key, value) in parsed.levels {
        let level: ExperienceLevel = key.parse().map_err(|_| SourceError::Parse {
            id: id.clone(),
            message: format!("unknown experience level \"{key}\" in levels plan"),
        })?;
        let additions: Vec<String> =
            serde_json::from_value(value).map_err(|e| SourceError::Parse {
                id: id.clone(),
                message: format!("levels.{key}: {e}"),
            })?;
        level_additions.insert(level, additions);
    }

    Ok(CurriculumSource {
        topic: TopicDraft {
            name: parsed.topic.name,
            slug: parsed.topic.slug,
            description: parsed.topic.description,
            order: parsed.topic.order,
            icon: parsed.topic.icon,
            color: parsed.topic.color,
        },
        id,
        taxonomy,
        level_additions,
        origin,
    })
}

fn bundled_sources() -> Vec<CurriculumSource> {
    [
        (PYTHON_JSON, "python"),
        (NETWORKING_JSON, "networking"),
        (TYPESCRIPT_JSON, "typescript"),
    ]
    .iter()
    .filter_map(
        |(json, id)| match parse_source(json, SourceOrigin::Bundled) {
            Ok(source) => Some(source),
            Err(e) => {
                tracing::warn!(source = id, "Failed to parse bundled curriculum: {e}");
                None
            }
        },
    )
    .collect()
}

// ── Source registry ─────────────────────────────────────────────────────

/// Registry of available curriculum sources (bundled + discovered from disk).
pub struct SourceRegistry {
    sources: BTreeMap<String, CurriculumSource>,
}

impl SourceRegistry {
    /// Registry with only the bundled sources.
    pub fn bundled() -> Self {
        let sources = bundled_sources()
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        Self { sources }
    }

    /// Discover `*.json` sources from a directory, in addition to the bundled
    /// ones. A discovered source with a bundled slug shadows the bundled copy.
    pub fn discover(sources_dir: &Path) -> Self {
        let mut registry = Self::bundled();

        if let Ok(entries) = std::fs::read_dir(sources_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match CurriculumSource::from_file(&path) {
                    Ok(source) => {
                        registry.sources.insert(source.id.clone(), source);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            "Failed to load curriculum source: {e}"
                        );
                    }
                }
            }
        }

        registry
    }

    /// All sources, sorted by id.
    pub fn list(&self) -> Vec<&CurriculumSource> {
        self.sources.values().collect()
    }

    /// Get a source by id (topic slug).
    pub fn get(&self, id: &str) -> SourceResult<&CurriculumSource> {
        self.sources
            .get(id)
            .ok_or_else(|| SourceError::NotFound { id: id.to_string() })
    }
}
