//! Store integrity audit.
//!
//! Detects the failure modes the reseed hardening exists to prevent — most
//! importantly the "topic with zero categories and zero sections" state left
//! behind by an interrupted unguarded rebuild — plus referential problems and
//! path-map staleness. Structural issues are surfaced to the operator; stale
//! path-map slugs are informational, since the resolver tolerates them by
//! design.

use std::collections::HashSet;
use std::fmt;

use crate::model::ExperienceLevel;
use crate::store::{CatalogStore, StoreResult};

/// One finding from an audit pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthIssue {
    /// Zero categories AND zero sections: the partial-reseed signature.
    EmptyTopic { topic: String },
    /// A section whose category no longer exists.
    OrphanSection { topic: String, section: String },
    /// A section whose category belongs to a different topic.
    TopicMismatch { topic: String, section: String },
    /// A path map entry referencing no live category. Tolerated at read time.
    StalePathMapSlug {
        topic: String,
        level: ExperienceLevel,
        slug: String,
    },
}

impl HealthIssue {
    /// Structural issues demand operator attention; informational ones don't.
    pub fn is_structural(&self) -> bool {
        !matches!(self, HealthIssue::StalePathMapSlug { .. })
    }
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthIssue::EmptyTopic { topic } => {
                write!(f, "topic \"{topic}\" has zero categories and zero sections")
            }
            HealthIssue::OrphanSection { topic, section } => {
                write!(f, "topic \"{topic}\": section \"{section}\" has no category")
            }
            HealthIssue::TopicMismatch { topic, section } => write!(
                f,
                "topic \"{topic}\": section \"{section}\" belongs to a category of another topic"
            ),
            HealthIssue::StalePathMapSlug { topic, level, slug } => write!(
                f,
                "topic \"{topic}\": path map for {level} references vanished category \"{slug}\""
            ),
        }
    }
}

/// Result of auditing the whole store.
#[derive(Debug, Default)]
pub struct HealthReport {
    pub topics_checked: usize,
    pub issues: Vec<HealthIssue>,
}

impl HealthReport {
    /// Whether any structural issue was found.
    pub fn has_structural_issues(&self) -> bool {
        self.issues.iter().any(HealthIssue::is_structural)
    }
}

/// Audit every topic in the store.
pub fn audit(store: &CatalogStore) -> StoreResult<HealthReport> {
    let mut report = HealthReport::default();

    for topic in store.list_topics()? {
        report.topics_checked += 1;

        let categories = store.categories_for_topic(topic.id)?;
        let sections = store.sections_for_topic(topic.id)?;

        if categories.is_empty() && sections.is_empty() {
            report.issues.push(HealthIssue::EmptyTopic {
                topic: topic.slug.clone(),
            });
        }

        for section in &sections {
            match categories.iter().find(|c| c.id == section.category_id) {
                None => report.issues.push(HealthIssue::OrphanSection {
                    topic: topic.slug.clone(),
                    section: section.title.clone(),
                }),
                Some(category) if category.topic_id != section.topic_id => {
                    report.issues.push(HealthIssue::TopicMismatch {
                        topic: topic.slug.clone(),
                        section: section.title.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let live_slugs: HashSet<&str> = categories.iter().map(|c| c.slug.as_str()).collect();
        for path_map in store.path_maps_for_topic(topic.id)? {
            for slug in &path_map.visible_category_slugs {
                if !live_slugs.contains(slug.as_str()) {
                    report.issues.push(HealthIssue::StalePathMapSlug {
                        topic: topic.slug.clone(),
                        level: path_map.experience_level,
                        slug: slug.clone(),
                    });
                }
            }
        }
    }

    Ok(report)
}
