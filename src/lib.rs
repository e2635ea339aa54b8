//! # curricula
//!
//! A curriculum content engine for educational platforms: ingests
//! hand-authored, arbitrarily-nested taxonomy documents and normalizes them
//! into a flat Topic → Category → Section hierarchy, then layers an
//! experience-level visibility filter on top.
//!
//! ## Architecture
//!
//! - **Slug allocation** (`slug`): run-scoped unique identifier generation
//! - **Difficulty tiers** (`difficulty`): keyword heuristics, advanced-first
//! - **Normalization** (`normalize`): recursive taxonomy flattening
//! - **Grouping** (`grouping`): confidence-tiered label assignment with a
//!   deterministic fallback
//! - **Reseeding** (`reseed`): destructive per-topic rebuild behind one ACID
//!   transaction
//! - **Path maps** (`pathmap`): per-(topic, level) category allowlists
//! - **Storage** (`store`): redb-backed catalog with per-topic write locks
//!
//! ## Library usage
//!
//! ```no_run
//! use curricula::grouping::GroupClassifier;
//! use curricula::reseed::Reseeder;
//! use curricula::sources::SourceRegistry;
//! use curricula::store::CatalogStore;
//!
//! let store = CatalogStore::open(std::path::Path::new(".curricula")).unwrap();
//! let classifier = GroupClassifier::pattern_only();
//! let registry = SourceRegistry::bundled();
//! let source = registry.get("python").unwrap();
//! let report = Reseeder::new(&store, &classifier).reseed(source).unwrap();
//! println!(
//!     "{}: {} categories, {} sections",
//!     report.topic_slug, report.counts.categories_created, report.counts.sections_created
//! );
//! ```

pub mod config;
pub mod difficulty;
pub mod error;
pub mod grouping;
pub mod health;
pub mod model;
pub mod normalize;
pub mod pathmap;
pub mod reseed;
pub mod slug;
pub mod sources;
pub mod store;
pub mod taxonomy;
