//! Idempotent Reseeder: destructive per-topic content rebuild.
//!
//! Per invocation for one topic: find-or-create the topic by slug, stage the
//! full replacement hierarchy through the normalizer (all network-bound
//! classification happens up front, outside any transaction), then swap the
//! topic's content in a single ACID transaction. The commit is the atomic
//! generation swap — an interruption at any point leaves either the old or
//! the new content, never a topic stripped of its sections.
//!
//! Reseeds for the same topic are serialized by the store's per-topic
//! advisory lock; two concurrent reseeds could otherwise interleave two
//! taxonomy versions.

use crate::error::ReseedError;
use crate::grouping::GroupClassifier;
use crate::normalize::Normalizer;
use crate::sources::CurriculumSource;
use crate::store::{CatalogStore, SwapCounts, durable::acquire};

/// Summary of one reseed run.
#[derive(Debug, Clone)]
pub struct ReseedReport {
    pub topic_slug: String,
    pub counts: SwapCounts,
    /// Malformed leaf items dropped by the normalizer.
    pub skipped_leaves: usize,
}

/// Orchestrates find-or-create, staging, and the transactional content swap.
pub struct Reseeder<'a> {
    store: &'a CatalogStore,
    classifier: &'a GroupClassifier,
}

impl<'a> Reseeder<'a> {
    pub fn new(store: &'a CatalogStore, classifier: &'a GroupClassifier) -> Self {
        Self { store, classifier }
    }

    /// Rebuild one topic's content from a curriculum source.
    ///
    /// Running twice with identical input yields identical content (record
    /// ids aside): the normalizer is deterministic and the swap replaces
    /// everything it owns.
    pub fn reseed(&self, source: &CurriculumSource) -> Result<ReseedReport, ReseedError> {
        let lock = self.store.topic_lock(&source.id);
        let _guard = acquire(&lock);

        let topic = self.store.ensure_topic(&source.topic)?;
        tracing::info!(topic = topic.slug.as_str(), "reseeding topic");

        // Stage first: suggest-service calls are slow and must not run inside
        // the write transaction.
        let normalized = Normalizer::new(self.classifier).flatten(&source.taxonomy, &source.id);
        if normalized.skipped_leaves > 0 {
            tracing::warn!(
                topic = topic.slug.as_str(),
                skipped = normalized.skipped_leaves,
                "dropped malformed leaf items during normalization"
            );
        }

        let counts = self
            .store
            .swap_topic_content(topic.id, &normalized.categories)?;

        self.verify_written(topic.id)?;

        tracing::info!(
            topic = topic.slug.as_str(),
            categories = counts.categories_created,
            sections = counts.sections_created,
            "reseed complete"
        );

        Ok(ReseedReport {
            topic_slug: topic.slug,
            counts,
            skipped_leaves: normalized.skipped_leaves,
        })
    }

    /// Post-write referential check: every section's category must exist and
    /// belong to the section's own topic. Violations are surfaced, not
    /// silently trusted.
    fn verify_written(&self, topic_id: u64) -> Result<(), ReseedError> {
        let categories = self.store.categories_for_topic(topic_id)?;
        for section in self.store.sections_for_topic(topic_id)? {
            let owner = categories.iter().find(|c| c.id == section.category_id);
            match owner {
                Some(category) if category.topic_id == section.topic_id => {}
                Some(category) => {
                    return Err(ReseedError::TopicMismatch {
                        section: section.title,
                        topic: section.topic_id,
                        category_topic: category.topic_id,
                    });
                }
                None => {
                    return Err(ReseedError::TopicMismatch {
                        section: section.title,
                        topic: section.topic_id,
                        category_topic: 0,
                    });
                }
            }
        }
        Ok(())
    }
}
