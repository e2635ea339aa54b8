//! PathMap Resolver: experience-level category visibility.
//!
//! Build-time resolves a source's curated, cumulative group-prefix plan
//! against the *persisted* category groups, storing one PathMap per
//! (topic, level) wholesale. Serve-time intersects a stored map with the live
//! category slugs — stale entries drop silently, absence means default-open.
//! The serve path is pure reads and safe for unlimited concurrent callers.

use std::collections::HashSet;

use crate::error::PathMapError;
use crate::model::{Category, ExperienceLevel, PathMap, RecordId};
use crate::sources::CurriculumSource;
use crate::store::{CatalogStore, durable::acquire};

/// Outcome of a visibility resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// No (usable) path map: show every category of the topic.
    Unrestricted,
    /// Restricted to these category slugs, in path-map order.
    Visible(Vec<String>),
}

/// Case-insensitive substring containment in either direction, tolerating
/// minor naming drift between configured prefixes and persisted groups.
fn group_matches(prefix: &str, group: &str) -> bool {
    let prefix = prefix.trim().to_lowercase();
    let group = group.trim().to_lowercase();
    if prefix.is_empty() || group.is_empty() {
        return false;
    }
    group.contains(&prefix) || prefix.contains(&group)
}

/// Builds and serves per-(topic, level) visibility maps.
pub struct PathMapResolver<'a> {
    store: &'a CatalogStore,
}

impl<'a> PathMapResolver<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self { store }
    }

    /// Build (or rebuild) every level's path map for a source's topic.
    ///
    /// The plan's prefixes are cumulative per level; each is matched against
    /// the categories actually persisted, and every matching category's slug
    /// is collected in category order. A source without a level plan builds
    /// nothing — its topic stays default-open.
    pub fn build_for_source(
        &self,
        source: &CurriculumSource,
    ) -> Result<Vec<PathMap>, PathMapError> {
        if !source.has_level_plan() {
            tracing::info!(topic = source.id.as_str(), "no level plan; topic stays open");
            return Ok(Vec::new());
        }

        let lock = self.store.topic_lock(&source.id);
        let _guard = acquire(&lock);

        let topic = self.store.require_topic(&source.id)?;
        let categories = self.store.categories_for_topic(topic.id)?;
        let mut built = Vec::new();

        for level in ExperienceLevel::ALL {
            let prefixes = source.prefixes_for_level(level);
            let slugs = select_slugs(&categories, &prefixes);
            let strategy = format!(
                "{} of {} categories curated from {} group prefixes",
                slugs.len(),
                categories.len(),
                prefixes.len()
            );

            tracing::info!(
                topic = source.id.as_str(),
                level = %level,
                visible = slugs.len(),
                total = categories.len(),
                "built path map"
            );
            built.push(self.store.put_path_map(topic.id, level, slugs, strategy)?);
        }

        Ok(built)
    }

    /// Resolve the visible category slugs for (topic, level).
    ///
    /// A missing path map, or one with an empty slug list, is the explicit
    /// default-open state. Otherwise the stored list is intersected with the
    /// live category slugs; entries referencing vanished categories drop
    /// silently — staleness is expected, never an error.
    pub fn resolve(
        &self,
        topic_id: RecordId,
        level: ExperienceLevel,
    ) -> Result<Visibility, PathMapError> {
        let Some(map) = self.store.path_map(topic_id, level)? else {
            return Ok(Visibility::Unrestricted);
        };
        if map.visible_category_slugs.is_empty() {
            return Ok(Visibility::Unrestricted);
        }

        let live: HashSet<String> = self
            .store
            .categories_for_topic(topic_id)?
            .into_iter()
            .map(|c| c.slug)
            .collect();

        let visible: Vec<String> = map
            .visible_category_slugs
            .into_iter()
            .filter(|slug| live.contains(slug))
            .collect();
        Ok(Visibility::Visible(visible))
    }

    /// A topic's categories filtered through the level's visibility, in
    /// category order. The read facade for level-aware listings.
    pub fn visible_categories(
        &self,
        topic_id: RecordId,
        level: ExperienceLevel,
    ) -> Result<Vec<Category>, PathMapError> {
        let categories = self.store.categories_for_topic(topic_id)?;
        match self.resolve(topic_id, level)? {
            Visibility::Unrestricted => Ok(categories),
            Visibility::Visible(slugs) => {
                let allowed: HashSet<&String> = slugs.iter().collect();
                Ok(categories
                    .into_iter()
                    .filter(|c| allowed.contains(&c.slug))
                    .collect())
            }
        }
    }
}

/// Collect slugs of categories whose group matches any prefix, in category
/// order, deduped.
fn select_slugs(categories: &[Category], prefixes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for category in categories {
        if prefixes.iter().any(|p| group_matches(p, &category.group))
            && seen.insert(category.slug.clone())
        {
            out.push(category.slug.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::grouping::GroupClassifier;
    use crate::reseed::Reseeder;
    use crate::sources::SourceOrigin;
    use crate::store::TopicDraft;
    use crate::taxonomy::Taxonomy;
    use tempfile::TempDir;

    fn demo_source() -> CurriculumSource {
        let mut level_additions = BTreeMap::new();
        level_additions.insert(
            ExperienceLevel::Junior,
            vec!["Foundations".to_string()],
        );
        level_additions.insert(ExperienceLevel::Mid, vec!["Internals".to_string()]);
        level_additions.insert(ExperienceLevel::Senior, vec!["Mastery".to_string()]);

        CurriculumSource {
            id: "demo".into(),
            topic: TopicDraft {
                name: "Demo".into(),
                slug: "demo".into(),
                description: "demo topic".into(),
                order: 1,
                icon: "📘".into(),
                color: "#333".into(),
            },
            taxonomy: Taxonomy::parse(
                r#"{
                    "Foundations": {"intro": ["What is X"], "setup": ["Install"]},
                    "Internals": {"engine": ["How X runs"]},
                    "Mastery": {"tuning": ["Make X fast"]}
                }"#,
            )
            .unwrap(),
            level_additions,
            origin: SourceOrigin::Bundled,
        }
    }

    fn seeded_store(dir: &TempDir) -> (CatalogStore, CurriculumSource) {
        let store = CatalogStore::open(dir.path()).unwrap();
        let classifier = GroupClassifier::pattern_only();
        let source = demo_source();
        Reseeder::new(&store, &classifier).reseed(&source).unwrap();
        (store, source)
    }

    #[test]
    fn group_matching_tolerates_drift() {
        assert!(group_matches("Foundations", "foundations"));
        assert!(group_matches("Basics", "Networking Basics"));
        assert!(group_matches("Networking Basics Extended", "Basics"));
        assert!(!group_matches("Mastery", "Foundations"));
        assert!(!group_matches("", "Foundations"));
    }

    #[test]
    fn build_produces_cumulative_supersets() {
        let dir = TempDir::new().unwrap();
        let (store, source) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);

        let maps = resolver.build_for_source(&source).unwrap();
        assert_eq!(maps.len(), 3);

        let topic = store.require_topic("demo").unwrap();
        let junior = store
            .path_map(topic.id, ExperienceLevel::Junior)
            .unwrap()
            .unwrap();
        let senior = store
            .path_map(topic.id, ExperienceLevel::Senior)
            .unwrap()
            .unwrap();

        assert_eq!(junior.visible_category_slugs, ["intro", "setup"]);
        assert_eq!(
            senior.visible_category_slugs,
            ["intro", "setup", "engine", "tuning"]
        );
        for slug in &junior.visible_category_slugs {
            assert!(senior.visible_category_slugs.contains(slug));
        }
    }

    #[test]
    fn rebuild_replaces_wholesale() {
        let dir = TempDir::new().unwrap();
        let (store, source) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);

        resolver.build_for_source(&source).unwrap();
        let maps = resolver.build_for_source(&source).unwrap();
        // Same content, bumped version, still exactly one map per level.
        assert_eq!(maps.len(), 3);
        assert!(maps.iter().all(|m| m.version == 2));

        let topic = store.require_topic("demo").unwrap();
        assert_eq!(store.path_maps_for_topic(topic.id).unwrap().len(), 3);
    }

    #[test]
    fn resolve_without_path_map_is_unrestricted() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);
        let topic = store.require_topic("demo").unwrap();

        assert_eq!(
            resolver.resolve(topic.id, ExperienceLevel::Junior).unwrap(),
            Visibility::Unrestricted
        );
    }

    #[test]
    fn resolve_with_empty_slug_list_is_unrestricted() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);
        let topic = store.require_topic("demo").unwrap();

        store
            .put_path_map(topic.id, ExperienceLevel::Junior, vec![], String::new())
            .unwrap();
        assert_eq!(
            resolver.resolve(topic.id, ExperienceLevel::Junior).unwrap(),
            Visibility::Unrestricted
        );
    }

    #[test]
    fn resolve_drops_stale_slugs_silently() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);
        let topic = store.require_topic("demo").unwrap();

        store
            .put_path_map(
                topic.id,
                ExperienceLevel::Junior,
                vec!["intro".into(), "deleted-chapter".into(), "setup".into()],
                String::new(),
            )
            .unwrap();

        let visibility = resolver.resolve(topic.id, ExperienceLevel::Junior).unwrap();
        assert_eq!(
            visibility,
            Visibility::Visible(vec!["intro".into(), "setup".into()])
        );
    }

    #[test]
    fn fully_stale_map_resolves_to_empty_visible_set() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);
        let topic = store.require_topic("demo").unwrap();

        store
            .put_path_map(
                topic.id,
                ExperienceLevel::Junior,
                vec!["ghost".into()],
                String::new(),
            )
            .unwrap();

        // Still no error: the map exists and is non-empty, so the (empty)
        // intersection is returned as-is.
        assert_eq!(
            resolver.resolve(topic.id, ExperienceLevel::Junior).unwrap(),
            Visibility::Visible(vec![])
        );
    }

    #[test]
    fn visible_categories_filters_in_category_order() {
        let dir = TempDir::new().unwrap();
        let (store, source) = seeded_store(&dir);
        let resolver = PathMapResolver::new(&store);
        let topic = store.require_topic("demo").unwrap();

        resolver.build_for_source(&source).unwrap();
        let juniors = resolver
            .visible_categories(topic.id, ExperienceLevel::Junior)
            .unwrap();
        let names: Vec<&str> = juniors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Intro", "Setup"]);

        let seniors = resolver
            .visible_categories(topic.id, ExperienceLevel::Senior)
            .unwrap();
        assert_eq!(seniors.len(), 4);
    }

    #[test]
    fn source_without_plan_builds_nothing() {
        let dir = TempDir::new().unwrap();
        let (store, mut source) = seeded_store(&dir);
        source.level_additions.clear();
        let resolver = PathMapResolver::new(&store);

        assert!(resolver.build_for_source(&source).unwrap().is_empty());
        let topic = store.require_topic("demo").unwrap();
        assert!(store.path_maps_for_topic(topic.id).unwrap().is_empty());
    }
}
