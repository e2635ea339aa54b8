//! Category grouping: confidence-tiered label assignment.
//!
//! A category's free-text `group` tag drives UI chaptering and path-map
//! allowlisting. Labels come from two places: an external suggest service
//! (optional, confidence-scored) and a deterministic first-match-wins rule
//! table over a fixed vocabulary. The confidence ladder arbitrating between
//! them is an explicit decision table so the tie-breaking policy stays
//! auditable and unit-testable on its own.

pub mod suggest;

use crate::error::SuggestError;
pub use suggest::{HttpSuggester, SuggestConfig, SuggestService, Suggestion};

/// Generic default label when nothing more specific applies.
pub const GENERIC_GROUP: &str = "General";

/// Accept an external suggestion outright at or above this confidence.
pub const ACCEPT_THRESHOLD: u8 = 70;
/// Below this, the external suggestion is distrusted entirely.
pub const MEDIUM_THRESHOLD: u8 = 50;
/// Relaxed acceptance bar for the single retry when the fallback is generic.
pub const RELAXED_THRESHOLD: u8 = 40;

// ── Deterministic rule table ────────────────────────────────────────────

/// One substring rule: any keyword match assigns the label.
struct GroupRule {
    keywords: &'static [&'static str],
    label: &'static str,
}

/// Ordered base rules, first match wins.
const BASE_RULES: &[GroupRule] = &[
    GroupRule {
        keywords: &[
            "fundamentals",
            "basics",
            "introduction",
            "intro",
            "getting started",
            "setup",
            "installation",
            "overview",
            "foundations",
        ],
        label: "Fundamentals",
    },
    GroupRule {
        keywords: &[
            "core",
            "essential",
            "key concept",
            "syntax",
            "data type",
            "variable",
            "operator",
        ],
        label: "Core Concepts",
    },
    GroupRule {
        keywords: &["function", "method", "closure", "callback"],
        label: "Functions",
    },
    GroupRule {
        keywords: &[
            "class",
            "object",
            "oop",
            "object-oriented",
            "inheritance",
            "polymorphism",
            "encapsulation",
            "abstract",
        ],
        label: "Object-Oriented Programming",
    },
    GroupRule {
        keywords: &["async", "promise", "await", "concurrent", "parallel"],
        label: "Asynchronous Programming",
    },
    GroupRule {
        keywords: &["array", "list", "stack", "queue", "linked list", "string"],
        label: "Linear Data Structures",
    },
    GroupRule {
        keywords: &["tree", "graph", "heap", "trie"],
        label: "Non-Linear Data Structures",
    },
    GroupRule {
        keywords: &["hash"],
        label: "Hashing",
    },
    GroupRule {
        keywords: &["sort", "search", "algorithm"],
        label: "Algorithms",
    },
    GroupRule {
        keywords: &["http", "request", "api", "rest", "fetch"],
        label: "Web APIs",
    },
    GroupRule {
        keywords: &["dom", "browser", "window", "document"],
        label: "Browser & DOM",
    },
    GroupRule {
        keywords: &["file", "stream", "i/o", "input", "output"],
        label: "File System & I/O",
    },
    GroupRule {
        keywords: &["database", "query", "sql", "crud", "transaction"],
        label: "Database Operations",
    },
    GroupRule {
        keywords: &["error", "exception", "debug", "testing"],
        label: "Error Handling & Testing",
    },
    GroupRule {
        keywords: &[
            "advanced",
            "performance",
            "optimization",
            "memory",
            "design pattern",
        ],
        label: "Advanced Topics",
    },
];

/// Base rules checked after the topic overlays, mirroring authored precedence:
/// e.g. "module" must not shadow the TypeScript "Modules & Namespaces" rule.
const TAIL_RULES: &[GroupRule] = &[
    GroupRule {
        keywords: &["module", "package", "import", "export"],
        label: "Modules & Packages",
    },
    GroupRule {
        keywords: &["security", "authentication", "authorization"],
        label: "Security",
    },
    GroupRule {
        keywords: &["best practice", "style guide", "convention", "pattern"],
        label: "Best Practices",
    },
    GroupRule {
        keywords: &["project", "practice", "exercise", "interview"],
        label: "Practice & Projects",
    },
];

/// TypeScript-specific overlay rules.
const TYPESCRIPT_RULES: &[GroupRule] = &[
    GroupRule {
        keywords: &["type", "interface", "generic", "utility"],
        label: "Type System",
    },
    GroupRule {
        keywords: &["decorator"],
        label: "Decorators",
    },
    GroupRule {
        keywords: &["configuration", "config"],
        label: "Configuration",
    },
    GroupRule {
        keywords: &["enum"],
        label: "Enumerations",
    },
    GroupRule {
        keywords: &["module", "namespace"],
        label: "Modules & Namespaces",
    },
];

/// Component-framework overlay rules (react, vue, angular).
const FRONTEND_RULES: &[GroupRule] = &[
    GroupRule {
        keywords: &["hook", "lifecycle"],
        label: "Component Lifecycle",
    },
    GroupRule {
        keywords: &["state", "props"],
        label: "State Management",
    },
    GroupRule {
        keywords: &["routing"],
        label: "Routing",
    },
];

fn match_rules(rules: &[GroupRule], haystack: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|rule| rule.label)
}

/// Deterministic group assignment: ordered substring rules with optional
/// topic overlays, ending in [`GENERIC_GROUP`].
pub fn fallback_group(category_name: &str, topic_slug: &str) -> &'static str {
    let lower = category_name.to_lowercase();
    let topic_lower = topic_slug.to_lowercase();

    if let Some(label) = match_rules(BASE_RULES, &lower) {
        return label;
    }
    if topic_lower.contains("typescript") {
        if let Some(label) = match_rules(TYPESCRIPT_RULES, &lower) {
            return label;
        }
    }
    if topic_lower.contains("react")
        || topic_lower.contains("vue")
        || topic_lower.contains("angular")
    {
        if let Some(label) = match_rules(FRONTEND_RULES, &lower) {
            return label;
        }
    }
    if let Some(label) = match_rules(TAIL_RULES, &lower) {
        return label;
    }
    GENERIC_GROUP
}

// ── Confidence ladder ───────────────────────────────────────────────────

/// Confidence bucket for an external suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBucket {
    /// ≥ 70: accept the external label.
    High,
    /// 50–69: prefer a specific deterministic match over the suggestion.
    Medium,
    /// < 50: distrust the suggestion entirely.
    Low,
}

impl ConfidenceBucket {
    pub fn from_confidence(confidence: u8) -> Self {
        if confidence >= ACCEPT_THRESHOLD {
            ConfidenceBucket::High
        } else if confidence >= MEDIUM_THRESHOLD {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }
}

/// What the ladder decided for one suggestion outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LadderChoice {
    /// Use the external label.
    External(String),
    /// Use the deterministic fallback label.
    Fallback,
}

/// The decision table: one suggestion outcome × fallback specificity → choice.
///
/// Medium-confidence external answers are treated as less trustworthy than a
/// specific deterministic match, but more trustworthy than the generic default.
fn decide(
    outcome: Result<Suggestion, SuggestError>,
    fallback_is_specific: bool,
) -> LadderChoice {
    match outcome {
        Ok(s) => match ConfidenceBucket::from_confidence(s.confidence) {
            ConfidenceBucket::High => LadderChoice::External(s.label),
            ConfidenceBucket::Medium if fallback_is_specific => LadderChoice::Fallback,
            ConfidenceBucket::Medium => LadderChoice::External(s.label),
            ConfidenceBucket::Low => LadderChoice::Fallback,
        },
        Err(_) => LadderChoice::Fallback,
    }
}

/// Confidence-tiered group classifier.
///
/// Wraps the optional external suggest service and the deterministic rules.
/// `assign` never fails: every error path lands on the deterministic scheme.
pub struct GroupClassifier {
    suggester: Option<Box<dyn SuggestService>>,
}

impl GroupClassifier {
    /// Classifier using the deterministic rules only.
    pub fn pattern_only() -> Self {
        Self { suggester: None }
    }

    /// Classifier consulting an external suggest service first.
    pub fn with_suggester(suggester: Box<dyn SuggestService>) -> Self {
        Self {
            suggester: Some(suggester),
        }
    }

    /// Whether an external suggester is configured.
    pub fn has_suggester(&self) -> bool {
        self.suggester.is_some()
    }

    /// Assign a group label for a category.
    pub fn assign(&self, category_name: &str, topic_slug: &str) -> String {
        let fallback = fallback_group(category_name, topic_slug);

        let Some(suggester) = &self.suggester else {
            return fallback.to_string();
        };

        let outcome = suggester.suggest(category_name, topic_slug);
        if let Err(e) = &outcome {
            tracing::warn!(category = category_name, "suggest service failed: {e}");
        }

        let chosen = decide(outcome, fallback != GENERIC_GROUP);
        match chosen {
            LadderChoice::External(label) => {
                tracing::debug!(category = category_name, group = %label, "accepted suggestion");
                label
            }
            LadderChoice::Fallback if fallback != GENERIC_GROUP => {
                tracing::debug!(category = category_name, group = fallback, "pattern match");
                fallback.to_string()
            }
            LadderChoice::Fallback => {
                // The deterministic scheme only offers the generic default:
                // one relaxed retry of the service before settling for it.
                match suggester.suggest(category_name, topic_slug) {
                    Ok(s) if s.confidence >= RELAXED_THRESHOLD => {
                        tracing::debug!(
                            category = category_name,
                            group = %s.label,
                            confidence = s.confidence,
                            "accepted suggestion on relaxed retry"
                        );
                        s.label
                    }
                    _ => {
                        tracing::debug!(category = category_name, "settled on generic group");
                        GENERIC_GROUP.to_string()
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for GroupClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupClassifier")
            .field("has_suggester", &self.suggester.is_some())
            .finish()
    }
}
