//! Hierarchy Normalizer: flattens a nested taxonomy into staged
//! Topic→Category→Section records.
//!
//! Two authored shapes are handled per group: a mapping of category keys
//! (each value flattened into that category's sections) and a plain sequence,
//! where the group itself collapses into a single category. Category order is
//! one monotonically increasing counter across the whole run; section order
//! restarts at 1 per category. One [`SlugAllocator`] spans the entire run, so
//! every slug — category or section — is unique within the topic.

use serde_json::Value;

use crate::difficulty;
use crate::grouping::GroupClassifier;
use crate::slug::SlugAllocator;
use crate::store::{CategoryDraft, SectionDraft};
use crate::taxonomy::{
    self, GroupShape, Leaf, Taxonomy, collect_leaves, format_display_name, format_title,
};

/// Default study-time estimate for a freshly seeded section.
const DEFAULT_ESTIMATED_MINUTES: u32 = 15;

/// The staged output of one normalization run.
#[derive(Debug, Default)]
pub struct NormalizedHierarchy {
    pub categories: Vec<CategoryDraft>,
    /// Leaves dropped because they were neither strings nor records.
    pub skipped_leaves: usize,
}

impl NormalizedHierarchy {
    /// Total staged sections across all categories.
    pub fn section_count(&self) -> usize {
        self.categories.iter().map(|c| c.sections.len()).sum()
    }
}

/// Recursive flattener over a parsed [`Taxonomy`].
///
/// Stateless apart from the borrowed classifier; all run-scoped state (slug
/// seen-set, order counters) lives in locals so concurrent runs cannot
/// interfere.
pub struct Normalizer<'a> {
    classifier: &'a GroupClassifier,
}

impl<'a> Normalizer<'a> {
    pub fn new(classifier: &'a GroupClassifier) -> Self {
        Self { classifier }
    }

    /// Flatten a taxonomy into staged categories and sections.
    ///
    /// A group key carrying a mapping provides the group label for its
    /// categories directly; a group key carrying a plain sequence has no
    /// structural label left once it collapses into a category, so its group
    /// label comes from the grouping classifier.
    pub fn flatten(&self, taxonomy: &Taxonomy, topic_slug: &str) -> NormalizedHierarchy {
        let mut slugs = SlugAllocator::new();
        let mut category_order = 1u32;
        let mut out = NormalizedHierarchy::default();

        for (group_key, group_value) in taxonomy.groups() {
            let group_name = format_display_name(group_key);

            match taxonomy::group_shape(group_value) {
                GroupShape::Mapping(categories) => {
                    for (category_key, category_value) in categories {
                        let name = format_display_name(category_key);
                        let leaves = collect_leaves(category_value);
                        let category = self.build_category(
                            name,
                            group_name.clone(),
                            &group_name,
                            &leaves,
                            &mut category_order,
                            &mut slugs,
                            &mut out.skipped_leaves,
                        );
                        out.categories.push(category);
                    }
                }
                GroupShape::Sequence(items) => {
                    let group_label = self.classifier.assign(&group_name, topic_slug);
                    let category = self.build_category(
                        group_name.clone(),
                        group_label,
                        &group_name,
                        items,
                        &mut category_order,
                        &mut slugs,
                        &mut out.skipped_leaves,
                    );
                    out.categories.push(category);
                }
                GroupShape::Other(value) => {
                    tracing::warn!(
                        group = group_key.as_str(),
                        "skipping group with unsupported shape: {value}"
                    );
                }
            }
        }

        out
    }

    #[allow(clippy::too_many_arguments)]
    fn build_category(
        &self,
        name: String,
        group: String,
        parent_context: &str,
        leaves: &[Value],
        category_order: &mut u32,
        slugs: &mut SlugAllocator,
        skipped: &mut usize,
    ) -> CategoryDraft {
        let slug = slugs.allocate(&name);
        let order = *category_order;
        *category_order += 1;

        let mut sections = Vec::new();
        let mut section_order = 1u32;

        for leaf in leaves {
            let title = match taxonomy::classify_leaf(leaf) {
                Leaf::Title(text) => format_title(text),
                Leaf::Record(record) => taxonomy::extract_title(record)
                    .unwrap_or_else(|| format!("Untitled Section {section_order}")),
                Leaf::Malformed(value) => {
                    tracing::warn!(
                        category = name.as_str(),
                        "skipping malformed leaf item: {value}"
                    );
                    *skipped += 1;
                    continue;
                }
            };

            sections.push(SectionDraft {
                slug: slugs.allocate(&title),
                order: section_order,
                difficulty: difficulty::classify(&title, parent_context),
                content: taxonomy::compose_content(leaf, &title),
                description: format!("Deep dive into {title}"),
                estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
                title,
            });
            section_order += 1;
        }

        CategoryDraft {
            description: format!("Chapter on {name}"),
            name,
            slug,
            order,
            group,
            sections,
        }
    }
}
