//! Run-scoped unique slug allocation.
//!
//! A [`SlugAllocator`] is an explicit per-run value threaded through the
//! normalizer — never a module-level singleton — so repeated or concurrent
//! reseed runs cannot leak seen-slug state into each other. Given an identical
//! input sequence it emits an identical slug sequence, which is what makes a
//! full reseed reproducible.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Allocates unique, URL-safe slugs for one reseed run.
///
/// Candidates are NFKD-folded to ASCII, lowercased, reduced to
/// alphanumerics-and-hyphens, and deduplicated against the run's seen-set with
/// `-2`, `-3`, … suffixes. The seen-set only ever grows.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    seen: HashSet<String>,
    /// Count of empty-after-normalization fallbacks issued this run.
    fallback_ordinal: u32,
}

impl SlugAllocator {
    /// Create a fresh allocator with an empty seen-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a unique slug for `candidate`.
    ///
    /// Empty-after-normalization input falls back to `section-<ordinal>`,
    /// which is itself deduplicated like any other candidate.
    pub fn allocate(&mut self, candidate: &str) -> String {
        let mut base = normalize(candidate);
        if base.is_empty() {
            self.fallback_ordinal += 1;
            base = format!("section-{}", self.fallback_ordinal);
        }

        let mut slug = base.clone();
        let mut counter = 1u32;
        while self.seen.contains(&slug) {
            counter += 1;
            slug = format!("{base}-{counter}");
        }
        self.seen.insert(slug.clone());
        slug
    }

    /// Whether a slug has already been issued this run.
    pub fn contains(&self, slug: &str) -> bool {
        self.seen.contains(slug)
    }

    /// Number of slugs issued so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no slugs have been issued yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Reduce text to lowercase ASCII alphanumerics and single hyphens.
///
/// NFKD decomposition first, so "Café" folds to "cafe" rather than dropping
/// the accented character entirely.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.nfkd() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else if is_combining_mark(ch) {
            // Marks left over from decomposition vanish without a separator,
            // so "Café" folds to "cafe" rather than "caf-e".
        } else {
            pending_hyphen = true;
        }
    }

    out
}
