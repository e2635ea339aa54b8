//! redb-backed catalog store.
//!
//! All writes go through transactions; reads use MVCC snapshots, so the
//! serve-time read path stays safe under unlimited concurrent readers while a
//! reseed is committing. Documents are stored as JSON bytes.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use redb::{Database, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::model::{Category, ExperienceLevel, PathMap, RecordId, Section, Topic};
use crate::store::{CategoryDraft, StoreResult, SwapCounts, TopicDraft};

/// Topics by id.
const TOPICS: TableDefinition<u64, &[u8]> = TableDefinition::new("topics");
/// Topic slug → id, the uniqueness index.
const TOPIC_SLUGS: TableDefinition<&str, u64> = TableDefinition::new("topic_slugs");
/// Categories keyed by (topic id, category id) so one topic is one key range.
const CATEGORIES: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("categories");
/// Sections keyed by (topic id, section id), same range layout.
const SECTIONS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("sections");
/// PathMaps keyed by (topic id, experience level wire string).
const PATH_MAPS: TableDefinition<(u64, &str), &[u8]> = TableDefinition::new("path_maps");
/// Store-wide counters (record id allocation).
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const NEXT_ID: &str = "next_id";

fn redb_err<E: std::fmt::Display>(op: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{op} failed: {e}"),
    }
}

fn to_doc<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

fn from_doc<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
        message: e.to_string(),
    })
}

/// The catalog store: topics, categories, sections, and path maps.
///
/// Also owns the per-topic advisory locks that serialize reseeds and path-map
/// builds — the single-writer-per-topic discipline. The locks are advisory:
/// read paths never take them.
pub struct CatalogStore {
    db: Arc<Database>,
    topic_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CatalogStore {
    /// Open or create a catalog store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("curricula.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        let store = Self {
            db: Arc::new(db),
            topic_locks: DashMap::new(),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Create every table up front so read transactions never race table creation.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        {
            txn.open_table(TOPICS)
                .map_err(redb_err("open_table"))?;
            txn.open_table(TOPIC_SLUGS)
                .map_err(redb_err("open_table"))?;
            txn.open_table(CATEGORIES)
                .map_err(redb_err("open_table"))?;
            txn.open_table(SECTIONS)
                .map_err(redb_err("open_table"))?;
            txn.open_table(PATH_MAPS)
                .map_err(redb_err("open_table"))?;
            txn.open_table(COUNTERS)
                .map_err(redb_err("open_table"))?;
        }
        txn.commit().map_err(redb_err("commit"))
    }

    /// Advisory lock for a topic slug. Hold the guard across a reseed or
    /// path-map build; never needed on read paths.
    pub fn topic_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        self.topic_locks
            .entry(slug.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ── Topics ──────────────────────────────────────────────────────────

    /// Look up a topic by slug.
    pub fn find_topic(&self, slug: &str) -> StoreResult<Option<Topic>> {
        let txn = self
            .db
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let slugs = txn
            .open_table(TOPIC_SLUGS)
            .map_err(redb_err("open_table"))?;
        let Some(id_guard) = slugs.get(slug).map_err(redb_err("get"))? else {
            return Ok(None);
        };
        let id = id_guard.value();
        let topics = txn
            .open_table(TOPICS)
            .map_err(redb_err("open_table"))?;
        let Some(doc) = topics.get(id).map_err(redb_err("get"))? else {
            return Ok(None);
        };
        Ok(Some(from_doc(doc.value())?))
    }

    /// Look up a topic by slug, erroring when absent.
    pub fn require_topic(&self, slug: &str) -> StoreResult<Topic> {
        self.find_topic(slug)?.ok_or_else(|| StoreError::TopicNotFound {
            slug: slug.to_string(),
        })
    }

    /// Find-or-create a topic by slug.
    ///
    /// An existing topic keeps its id but has its cosmetic fields (name,
    /// description, order, icon, color) refreshed from the draft.
    pub fn ensure_topic(&self, draft: &TopicDraft) -> StoreResult<Topic> {
        let txn = self
            .db
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let topic = {
            let mut slugs = txn
                .open_table(TOPIC_SLUGS)
                .map_err(redb_err("open_table"))?;
            let mut topics = txn
                .open_table(TOPICS)
                .map_err(redb_err("open_table"))?;

            let existing_id = slugs
                .get(draft.slug.as_str())
                .map_err(redb_err("get"))?
                .map(|g| g.value());

            let id = match existing_id {
                Some(id) => id,
                None => {
                    let mut counters = txn
                        .open_table(COUNTERS)
                        .map_err(redb_err("open_table"))?;
                    allocate_id(&mut counters)?
                }
            };

            let topic = Topic {
                id,
                name: draft.name.clone(),
                slug: draft.slug.clone(),
                description: draft.description.clone(),
                order: draft.order,
                icon: draft.icon.clone(),
                color: draft.color.clone(),
            };
            topics
                .insert(id, to_doc(&topic)?.as_slice())
                .map_err(redb_err("insert"))?;
            slugs
                .insert(draft.slug.as_str(), id)
                .map_err(redb_err("insert"))?;
            topic
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(topic)
    }

    /// All topics, sorted by their curated order.
    pub fn list_topics(&self) -> StoreResult<Vec<Topic>> {
        let txn = self
            .db
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let topics = txn
            .open_table(TOPICS)
            .map_err(redb_err("open_table"))?;
        let mut out = Vec::new();
        for entry in topics.iter().map_err(redb_err("iter"))? {
            let (_, doc) = entry.map_err(redb_err("iter"))?;
            out.push(from_doc::<Topic>(doc.value())?);
        }
        out.sort_by_key(|t| t.order);
        Ok(out)
    }

    // ── Categories & sections ───────────────────────────────────────────

    /// All categories of a topic, sorted by order.
    pub fn categories_for_topic(&self, topic_id: RecordId) -> StoreResult<Vec<Category>> {
        let mut out: Vec<Category> = self.scan_topic_range(CATEGORIES, topic_id)?;
        out.sort_by_key(|c| c.order);
        Ok(out)
    }

    /// All sections of a topic, unordered.
    pub fn sections_for_topic(&self, topic_id: RecordId) -> StoreResult<Vec<Section>> {
        self.scan_topic_range(SECTIONS, topic_id)
    }

    /// Look up one of a topic's categories by slug, erroring when absent.
    pub fn require_category(&self, topic: &Topic, slug: &str) -> StoreResult<Category> {
        self.categories_for_topic(topic.id)?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| StoreError::CategoryNotFound {
                topic: topic.slug.clone(),
                slug: slug.to_string(),
            })
    }

    /// The sections of one category, sorted by order.
    pub fn sections_for_category(
        &self,
        topic_id: RecordId,
        category_id: RecordId,
    ) -> StoreResult<Vec<Section>> {
        let mut out: Vec<Section> = self
            .sections_for_topic(topic_id)?
            .into_iter()
            .filter(|s| s.category_id == category_id)
            .collect();
        out.sort_by_key(|s| s.order);
        Ok(out)
    }

    /// (category count, section count) for a topic — the empty-topic health probe.
    pub fn content_counts(&self, topic_id: RecordId) -> StoreResult<(usize, usize)> {
        Ok((
            self.categories_for_topic(topic_id)?.len(),
            self.sections_for_topic(topic_id)?.len(),
        ))
    }

    fn scan_topic_range<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, (u64, u64), &'static [u8]>,
        topic_id: RecordId,
    ) -> StoreResult<Vec<T>> {
        let txn = self
            .db
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(table)
            .map_err(redb_err("open_table"))?;
        let mut out = Vec::new();
        let range = (topic_id, 0u64)..=(topic_id, u64::MAX);
        for entry in table.range(range).map_err(redb_err("range"))? {
            let (_, doc) = entry.map_err(redb_err("range"))?;
            out.push(from_doc(doc.value())?);
        }
        Ok(out)
    }

    /// Replace a topic's entire category/section content in one transaction.
    ///
    /// Deletes sections before categories (children before parents), then
    /// inserts the staged replacements. The commit is the atomic generation
    /// swap: an interruption anywhere before it leaves the previous content
    /// fully intact, so the "topic with zero sections" window cannot occur.
    pub fn swap_topic_content(
        &self,
        topic_id: RecordId,
        staged: &[CategoryDraft],
    ) -> StoreResult<SwapCounts> {
        let mut counts = SwapCounts::default();
        let txn = self
            .db
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        {
            let mut sections = txn
                .open_table(SECTIONS)
                .map_err(redb_err("open_table"))?;
            let mut categories = txn
                .open_table(CATEGORIES)
                .map_err(redb_err("open_table"))?;
            let mut counters = txn
                .open_table(COUNTERS)
                .map_err(redb_err("open_table"))?;

            counts.sections_deleted = delete_topic_range(&mut sections, topic_id)?;
            counts.categories_deleted = delete_topic_range(&mut categories, topic_id)?;

            for draft in staged {
                let category_id = allocate_id(&mut counters)?;
                let category = Category {
                    id: category_id,
                    topic_id,
                    name: draft.name.clone(),
                    slug: draft.slug.clone(),
                    order: draft.order,
                    group: draft.group.clone(),
                    description: draft.description.clone(),
                };
                categories
                    .insert((topic_id, category_id), to_doc(&category)?.as_slice())
                    .map_err(redb_err("insert"))?;
                counts.categories_created += 1;

                for section_draft in &draft.sections {
                    let section_id = allocate_id(&mut counters)?;
                    let section = Section {
                        id: section_id,
                        topic_id,
                        category_id,
                        title: section_draft.title.clone(),
                        slug: section_draft.slug.clone(),
                        order: section_draft.order,
                        difficulty: section_draft.difficulty,
                        content: section_draft.content.clone(),
                        description: section_draft.description.clone(),
                        estimated_minutes: section_draft.estimated_minutes,
                    };
                    sections
                        .insert((topic_id, section_id), to_doc(&section)?.as_slice())
                        .map_err(redb_err("insert"))?;
                    counts.sections_created += 1;
                }
            }
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(counts)
    }

    // ── Path maps ───────────────────────────────────────────────────────

    /// The path map for (topic, level), if one has been built.
    pub fn path_map(
        &self,
        topic_id: RecordId,
        level: ExperienceLevel,
    ) -> StoreResult<Option<PathMap>> {
        let txn = self
            .db
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(PATH_MAPS)
            .map_err(redb_err("open_table"))?;
        let Some(doc) = table
            .get((topic_id, level.as_str()))
            .map_err(redb_err("get"))?
        else {
            return Ok(None);
        };
        Ok(Some(from_doc(doc.value())?))
    }

    /// All path maps for a topic.
    pub fn path_maps_for_topic(&self, topic_id: RecordId) -> StoreResult<Vec<PathMap>> {
        let txn = self
            .db
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(PATH_MAPS)
            .map_err(redb_err("open_table"))?;
        let mut out = Vec::new();
        let range = (topic_id, "")..=(topic_id, "\u{10FFFF}");
        for entry in table.range(range).map_err(redb_err("range"))? {
            let (_, doc) = entry.map_err(redb_err("range"))?;
            out.push(from_doc(doc.value())?);
        }
        Ok(out)
    }

    /// Write a path map wholesale, replacing any prior document for the pair.
    ///
    /// The stored version is the prior version plus one (starting at 1).
    pub fn put_path_map(
        &self,
        topic_id: RecordId,
        level: ExperienceLevel,
        visible_category_slugs: Vec<String>,
        learning_strategy: String,
    ) -> StoreResult<PathMap> {
        let txn = self
            .db
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let path_map = {
            let mut table = txn
                .open_table(PATH_MAPS)
                .map_err(redb_err("open_table"))?;
            let mut counters = txn
                .open_table(COUNTERS)
                .map_err(redb_err("open_table"))?;

            let prior: Option<PathMap> = table
                .get((topic_id, level.as_str()))
                .map_err(redb_err("get"))?
                .map(|doc| from_doc(doc.value()))
                .transpose()?;

            let path_map = PathMap {
                id: prior
                    .as_ref()
                    .map(|p| p.id)
                    .map_or_else(|| allocate_id(&mut counters), Ok)?,
                topic_id,
                experience_level: level,
                visible_category_slugs,
                learning_strategy,
                version: prior.map(|p| p.version).unwrap_or(0) + 1,
            };
            table
                .insert((topic_id, level.as_str()), to_doc(&path_map)?.as_slice())
                .map_err(redb_err("insert"))?;
            path_map
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(path_map)
    }

    /// Delete every path map for a topic. Returns how many were removed.
    pub fn delete_path_maps(&self, topic_id: RecordId) -> StoreResult<usize> {
        let txn = self
            .db
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let removed = {
            let mut table = txn
                .open_table(PATH_MAPS)
                .map_err(redb_err("open_table"))?;
            let keys: Vec<String> = {
                let range = (topic_id, "")..=(topic_id, "\u{10FFFF}");
                table
                    .range(range)
                    .map_err(redb_err("range"))?
                    .map(|entry| {
                        entry
                            .map(|(key, _)| key.value().1.to_string())
                            .map_err(redb_err("range"))
                    })
                    .collect::<StoreResult<_>>()?
            };
            for level in &keys {
                table
                    .remove((topic_id, level.as_str()))
                    .map_err(redb_err("remove"))?;
            }
            keys.len()
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(removed)
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore").finish()
    }
}

/// Bump and return the next record id.
fn allocate_id(counters: &mut redb::Table<'_, &'static str, u64>) -> StoreResult<RecordId> {
    let next = counters
        .get(NEXT_ID)
        .map_err(redb_err("get"))?
        .map(|g| g.value())
        .unwrap_or(1);
    counters
        .insert(NEXT_ID, next + 1)
        .map_err(redb_err("insert"))?;
    Ok(next)
}

/// Remove every entry in a topic's key range. Returns how many were removed.
fn delete_topic_range(
    table: &mut redb::Table<'_, (u64, u64), &'static [u8]>,
    topic_id: RecordId,
) -> StoreResult<usize> {
    let keys: Vec<(u64, u64)> = {
        let range = (topic_id, 0u64)..=(topic_id, u64::MAX);
        table
            .range(range)
            .map_err(redb_err("range"))?
            .map(|entry| {
                entry
                    .map(|(key, _)| key.value())
                    .map_err(redb_err("range"))
            })
            .collect::<StoreResult<_>>()?
    };
    for key in &keys {
        table
            .remove(*key)
            .map_err(redb_err("remove"))?;
    }
    Ok(keys.len())
}

/// Lock a topic mutex, recovering from a poisoned guard.
///
/// Reseeds never leave shared state half-written (the store transaction is the
/// unit of consistency), so a panic in a previous holder is safe to ignore.
pub fn acquire(lock: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::store::SectionDraft;
    use tempfile::TempDir;

    fn draft_topic(slug: &str) -> TopicDraft {
        TopicDraft {
            name: slug.to_uppercase(),
            slug: slug.into(),
            description: format!("all about {slug}"),
            order: 1,
            icon: "📘".into(),
            color: "#3776ab".into(),
        }
    }

    fn draft_category(name: &str, order: u32, sections: &[&str]) -> CategoryDraft {
        CategoryDraft {
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            order,
            group: "Fundamentals".into(),
            description: format!("Chapter on {name}"),
            sections: sections
                .iter()
                .enumerate()
                .map(|(i, title)| SectionDraft {
                    title: (*title).into(),
                    slug: title.to_lowercase().replace(' ', "-"),
                    order: (i + 1) as u32,
                    difficulty: Difficulty::Beginner,
                    content: format!("## {title}"),
                    description: format!("Deep dive into {title}"),
                    estimated_minutes: 15,
                })
                .collect(),
        }
    }

    #[test]
    fn ensure_topic_creates_then_updates_cosmetics() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();

        let created = store.ensure_topic(&draft_topic("python")).unwrap();
        let mut updated_draft = draft_topic("python");
        updated_draft.description = "rewritten".into();
        let updated = store.ensure_topic(&updated_draft).unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.description, "rewritten");
        assert_eq!(store.list_topics().unwrap().len(), 1);
    }

    #[test]
    fn swap_replaces_content_and_counts() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        let topic = store.ensure_topic(&draft_topic("demo")).unwrap();

        let first = vec![
            draft_category("Alpha", 1, &["One", "Two"]),
            draft_category("Beta", 2, &["Three"]),
        ];
        let counts = store.swap_topic_content(topic.id, &first).unwrap();
        assert_eq!(counts.categories_created, 2);
        assert_eq!(counts.sections_created, 3);
        assert_eq!(counts.categories_deleted, 0);

        let second = vec![draft_category("Gamma", 1, &["Four"])];
        let counts = store.swap_topic_content(topic.id, &second).unwrap();
        assert_eq!(counts.categories_deleted, 2);
        assert_eq!(counts.sections_deleted, 3);
        assert_eq!(counts.categories_created, 1);

        let categories = store.categories_for_topic(topic.id).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Gamma");
        let sections = store.sections_for_topic(topic.id).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category_id, categories[0].id);
    }

    #[test]
    fn swap_does_not_touch_other_topics() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        let python = store.ensure_topic(&draft_topic("python")).unwrap();
        let rust = store.ensure_topic(&draft_topic("rust")).unwrap();

        store
            .swap_topic_content(python.id, &[draft_category("Py", 1, &["A"])])
            .unwrap();
        store
            .swap_topic_content(rust.id, &[draft_category("Rs", 1, &["B", "C"])])
            .unwrap();
        store.swap_topic_content(python.id, &[]).unwrap();

        assert_eq!(store.content_counts(python.id).unwrap(), (0, 0));
        assert_eq!(store.content_counts(rust.id).unwrap(), (1, 2));
    }

    #[test]
    fn path_map_upsert_bumps_version() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        let topic = store.ensure_topic(&draft_topic("demo")).unwrap();

        let v1 = store
            .put_path_map(
                topic.id,
                ExperienceLevel::Junior,
                vec!["intro".into()],
                String::new(),
            )
            .unwrap();
        let v2 = store
            .put_path_map(
                topic.id,
                ExperienceLevel::Junior,
                vec!["intro".into(), "basics".into()],
                String::new(),
            )
            .unwrap();

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(v1.id, v2.id);

        let fetched = store
            .path_map(topic.id, ExperienceLevel::Junior)
            .unwrap()
            .unwrap();
        assert_eq!(fetched.visible_category_slugs.len(), 2);
        assert!(
            store
                .path_map(topic.id, ExperienceLevel::Senior)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn delete_path_maps_clears_topic() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        let topic = store.ensure_topic(&draft_topic("demo")).unwrap();

        for level in ExperienceLevel::ALL {
            store
                .put_path_map(topic.id, level, vec!["x".into()], String::new())
                .unwrap();
        }
        assert_eq!(store.path_maps_for_topic(topic.id).unwrap().len(), 3);
        assert_eq!(store.delete_path_maps(topic.id).unwrap(), 3);
        assert!(store.path_maps_for_topic(topic.id).unwrap().is_empty());
    }

    #[test]
    fn topic_lock_is_shared_per_slug() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::open(dir.path()).unwrap();
        let a = store.topic_lock("python");
        let b = store.topic_lock("python");
        assert!(Arc::ptr_eq(&a, &b));
        let other = store.topic_lock("rust");
        assert!(!Arc::ptr_eq(&a, &other));
    }
}
