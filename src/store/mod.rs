//! Persistence for the content hierarchy.
//!
//! The store is deliberately narrow: four record kinds organized as a
//! parent-pointer tree (Section → Category → Topic) plus the PathMap
//! side-table keyed by (topic, experience level). The backing engine is
//! [`redb`] — single file, ACID write transactions, MVCC snapshot reads —
//! and its transactions are what make the destructive reseed safe: the
//! delete-then-recreate of a topic's content commits atomically in
//! [`CatalogStore::swap_topic_content`].

pub mod durable;

pub use durable::CatalogStore;

use crate::error::StoreError;
use crate::model::Difficulty;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Topic fields as staged by a reseed, before an id is assigned.
#[derive(Debug, Clone)]
pub struct TopicDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub order: u32,
    pub icon: String,
    pub color: String,
}

/// A staged category with its staged sections, ready for the content swap.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub slug: String,
    pub order: u32,
    pub group: String,
    pub description: String,
    pub sections: Vec<SectionDraft>,
}

/// A staged section, owned by a [`CategoryDraft`].
#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub title: String,
    pub slug: String,
    pub order: u32,
    pub difficulty: Difficulty,
    pub content: String,
    pub description: String,
    pub estimated_minutes: u32,
}

/// Counts reported by one content swap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapCounts {
    pub categories_deleted: usize,
    pub sections_deleted: usize,
    pub categories_created: usize,
    pub sections_created: usize,
}
