//! Keyword-heuristic difficulty tier assignment.
//!
//! Strictly first-match-in-priority-order: the advanced list is checked before
//! the intermediate list because the vocabularies overlap (e.g. "performance"
//! would otherwise be claimed by a lower tier). Not a weighted score.

use crate::model::Difficulty;

/// Keywords that mark a lesson as advanced, checked first.
const ADVANCED_KEYWORDS: &[&str] = &[
    "advanced",
    "closures",
    "prototype",
    "asynchronous",
    "promises",
    "event loop",
    "generators",
    "proxy",
    "metaclass",
    "metaprogramming",
    "performance",
    "optimization",
    "memory",
    "design",
    "patterns",
    "worker",
    "internals",
    "concurrency",
    "parallel",
    "distributed",
    "expert",
];

/// Keywords that mark a lesson as intermediate, checked after the advanced list.
const INTERMEDIATE_KEYWORDS: &[&str] = &[
    "intermediate",
    "arrays",
    "objects",
    "this",
    "dom",
    "fetch",
    "error handling",
    "functions",
    "scope",
    "modules",
    "iterators",
    "routing",
    "testing",
    "troubleshooting",
    "inheritance",
];

/// Classify a lesson by title plus its parent context (the group name).
///
/// Both inputs are concatenated and lowercased before matching, so a parent
/// group like "Advanced OOP" pushes all of its lessons up a tier.
pub fn classify(title: &str, parent_context: &str) -> Difficulty {
    let haystack = format!("{} {}", title.to_lowercase(), parent_context.to_lowercase());

    if ADVANCED_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        return Difficulty::Advanced;
    }
    if INTERMEDIATE_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        return Difficulty::Intermediate;
    }
    Difficulty::Beginner
}
