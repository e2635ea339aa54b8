//! Persisted record types for the three-level content hierarchy.
//!
//! `Topic` → `Category` → `Section` form a parent-pointer tree; `PathMap` is a
//! derived side-table keyed by (topic, experience level). Categories and
//! sections are never partially updated — their lifecycle is bulk
//! delete-and-recreate on every reseed of the owning topic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathMapError;

/// Record identifier, allocated from a store-wide counter.
pub type RecordId = u64;

/// Top-level subject area. Curated by hand, small cardinality, rarely mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: RecordId,
    /// Unique display name.
    pub name: String,
    /// Unique URL-safe identifier.
    pub slug: String,
    pub description: String,
    pub order: u32,
    pub icon: String,
    pub color: String,
}

/// A chapter within a topic. Owned exclusively by its topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: RecordId,
    pub topic_id: RecordId,
    pub name: String,
    /// Unique within the owning topic.
    pub slug: String,
    pub order: u32,
    /// Free-text classification tag, used for UI chaptering and path maps.
    pub group: String,
    pub description: String,
}

/// A single lesson within a category. Owned exclusively by its category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: RecordId,
    pub topic_id: RecordId,
    pub category_id: RecordId,
    pub title: String,
    pub slug: String,
    /// 1-based, resets per category.
    pub order: u32,
    pub difficulty: Difficulty,
    pub content: String,
    pub description: String,
    pub estimated_minutes: u32,
}

/// Cached per-(topic, experience level) allowlist of visible category slugs.
///
/// Recomputed wholesale, never patched. Its slug list is allowed to drift out
/// of sync with live categories; the resolver drops stale entries at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathMap {
    pub id: RecordId,
    pub topic_id: RecordId,
    pub experience_level: ExperienceLevel,
    pub visible_category_slugs: Vec<String>,
    pub learning_strategy: String,
    pub version: u64,
}

/// Lesson difficulty tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// Coarse learner-seniority bucket.
///
/// Wire strings match the stored documents (`0-1_year`, `1-3_years`,
/// `3-5_years`); parsing also accepts the compact `0-1y` / `1-3y` / `3-5y`
/// spellings for CLI convenience.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExperienceLevel {
    #[serde(rename = "0-1_year")]
    Junior,
    #[serde(rename = "1-3_years")]
    Mid,
    #[serde(rename = "3-5_years")]
    Senior,
}

impl ExperienceLevel {
    /// All levels, lowest first.
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
    ];

    /// Stored wire string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "0-1_year",
            ExperienceLevel::Mid => "1-3_years",
            ExperienceLevel::Senior => "3-5_years",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = PathMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-1_year" | "0-1y" | "0-1" => Ok(ExperienceLevel::Junior),
            "1-3_years" | "1-3y" | "1-3" => Ok(ExperienceLevel::Mid),
            "3-5_years" | "3-5y" | "3-5" => Ok(ExperienceLevel::Senior),
            other => Err(PathMapError::UnknownLevel {
                value: other.to_string(),
            }),
        }
    }
}
