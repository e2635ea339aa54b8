//! curricula CLI: curriculum content engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use curricula::config::CurriculaConfig;
use curricula::grouping::{GroupClassifier, HttpSuggester};
use curricula::health;
use curricula::model::ExperienceLevel;
use curricula::pathmap::{PathMapResolver, Visibility};
use curricula::reseed::Reseeder;
use curricula::sources::{CurriculumSource, SourceOrigin, SourceRegistry};
use curricula::store::CatalogStore;

#[derive(Parser)]
#[command(name = "curricula", version, about = "Curriculum content engine")]
struct Cli {
    /// Data directory for the catalog store.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the external suggest service; use pattern rules only.
    #[arg(long, global = true)]
    no_suggest: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new curricula data directory.
    Init,

    /// List and inspect curriculum sources.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Rebuild a topic's content from its curriculum source.
    Reseed {
        /// Source id (topic slug). Omit with --all to reseed everything.
        source: Option<String>,

        /// Reseed every known source.
        #[arg(long)]
        all: bool,
    },

    /// Build and query experience-level path maps.
    Pathmap {
        #[command(subcommand)]
        action: PathmapAction,
    },

    /// List a topic's categories with section counts.
    Categories {
        /// Topic slug.
        #[arg(long)]
        topic: String,

        /// Experience level filter (e.g. 0-1_year or 1-3y).
        #[arg(long)]
        level: Option<String>,
    },

    /// List one category's sections.
    Sections {
        /// Topic slug.
        #[arg(long)]
        topic: String,

        /// Category slug.
        #[arg(long)]
        category: String,
    },

    /// Audit the store for structural problems.
    Health,

    /// Show store statistics.
    Info,
}

#[derive(Subcommand)]
enum SourceAction {
    /// List all known curriculum sources.
    List,
    /// Show one source's structure and level plan.
    Show {
        /// Source id (topic slug).
        id: String,
    },
}

#[derive(Subcommand)]
enum PathmapAction {
    /// Build path maps from a source's level plan.
    Build {
        /// Source id (topic slug). Omit with --all to build everything.
        source: Option<String>,

        /// Build for every known source.
        #[arg(long)]
        all: bool,
    },
    /// Resolve the visible categories for a topic and level.
    Resolve {
        /// Topic slug.
        #[arg(long)]
        topic: String,

        /// Experience level (e.g. 0-1_year or 1-3y).
        #[arg(long)]
        level: String,
    },
    /// Delete a topic's path maps, returning it to the default-open state.
    Clear {
        /// Topic slug.
        #[arg(long)]
        topic: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CurriculaConfig::load(path).into_diagnostic()?,
        None => CurriculaConfig::default(),
    };
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".curricula"));

    let registry = match &config.sources_dir {
        Some(dir) => SourceRegistry::discover(dir),
        None => SourceRegistry::bundled(),
    };

    match cli.command {
        Commands::Init => {
            let _store = CatalogStore::open(&data_dir).into_diagnostic()?;
            println!("Initialized curricula store at {}", data_dir.display());
        }

        Commands::Source { action } => match action {
            SourceAction::List => {
                let sources = registry.list();
                println!("Curriculum sources ({}):", sources.len());
                for source in sources {
                    let origin = match &source.origin {
                        SourceOrigin::Bundled => "bundled".to_string(),
                        SourceOrigin::External(path) => path.display().to_string(),
                    };
                    println!(
                        "  {} - \"{}\" ({} groups) [{}]",
                        source.id,
                        source.topic.name,
                        source.taxonomy.len(),
                        origin
                    );
                }
            }
            SourceAction::Show { id } => {
                let source = registry.get(&id).into_diagnostic()?;
                println!("Source: {}", source.id);
                println!("  name:        {}", source.topic.name);
                println!("  description: {}", source.topic.description);
                println!("  groups:      {}", source.taxonomy.len());
                for level in ExperienceLevel::ALL {
                    let prefixes = source.prefixes_for_level(level);
                    println!("  {:<10} {} group prefixes", level.to_string(), prefixes.len());
                }
            }
        },

        Commands::Reseed { source, all } => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let classifier = build_classifier(&config, cli.no_suggest);
            let reseeder = Reseeder::new(&store, &classifier);

            for source in select_sources(&registry, source, all)? {
                let report = reseeder.reseed(source).into_diagnostic()?;
                println!("Reseeded \"{}\":", report.topic_slug);
                println!("  categories: {}", report.counts.categories_created);
                println!("  sections:   {}", report.counts.sections_created);
                if report.skipped_leaves > 0 {
                    println!("  skipped:    {} malformed leaf items", report.skipped_leaves);
                }
            }
        }

        Commands::Pathmap { action } => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let resolver = PathMapResolver::new(&store);

            match action {
                PathmapAction::Build { source, all } => {
                    for source in select_sources(&registry, source, all)? {
                        let maps = resolver.build_for_source(source).into_diagnostic()?;
                        if maps.is_empty() {
                            println!("\"{}\": no level plan, topic stays open", source.id);
                            continue;
                        }
                        println!("Built path maps for \"{}\":", source.id);
                        for map in maps {
                            println!(
                                "  {:<10} {} visible categories (v{})",
                                map.experience_level.to_string(),
                                map.visible_category_slugs.len(),
                                map.version
                            );
                        }
                    }
                }
                PathmapAction::Clear { topic } => {
                    let topic = store.require_topic(&topic).into_diagnostic()?;
                    let removed = store.delete_path_maps(topic.id).into_diagnostic()?;
                    println!(
                        "Deleted {removed} path maps for \"{}\"; all categories are visible again.",
                        topic.slug
                    );
                }
                PathmapAction::Resolve { topic, level } => {
                    let level: ExperienceLevel = level.parse().into_diagnostic()?;
                    let topic = store.require_topic(&topic).into_diagnostic()?;
                    match resolver.resolve(topic.id, level).into_diagnostic()? {
                        Visibility::Unrestricted => {
                            println!("{} @ {level}: unrestricted (all categories visible)", topic.slug)
                        }
                        Visibility::Visible(slugs) => {
                            println!("{} @ {level}: {} visible categories", topic.slug, slugs.len());
                            for slug in slugs {
                                println!("  {slug}");
                            }
                        }
                    }
                }
            }
        }

        Commands::Categories { topic, level } => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let topic = store.require_topic(&topic).into_diagnostic()?;

            let categories = match level {
                Some(level) => {
                    let level: ExperienceLevel = level.parse().into_diagnostic()?;
                    PathMapResolver::new(&store)
                        .visible_categories(topic.id, level)
                        .into_diagnostic()?
                }
                None => store.categories_for_topic(topic.id).into_diagnostic()?,
            };

            println!("Categories of \"{}\" ({}):", topic.slug, categories.len());
            for category in categories {
                let sections = store
                    .sections_for_category(topic.id, category.id)
                    .into_diagnostic()?;
                println!(
                    "  {:>3}. {} [{}] - {} sections",
                    category.order,
                    category.name,
                    category.group,
                    sections.len()
                );
            }
        }

        Commands::Sections { topic, category } => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let topic = store.require_topic(&topic).into_diagnostic()?;
            let category = store.require_category(&topic, &category).into_diagnostic()?;

            let sections = store
                .sections_for_category(topic.id, category.id)
                .into_diagnostic()?;
            println!(
                "Sections of \"{}\" / \"{}\" ({}):",
                topic.slug,
                category.slug,
                sections.len()
            );
            for section in sections {
                println!(
                    "  {:>3}. {} [{}] ~{}min",
                    section.order, section.title, section.difficulty, section.estimated_minutes
                );
            }
        }

        Commands::Health => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let report = health::audit(&store).into_diagnostic()?;

            println!("Checked {} topics.", report.topics_checked);
            if report.issues.is_empty() {
                println!("No issues found.");
            } else {
                for issue in &report.issues {
                    let marker = if issue.is_structural() { "!" } else { "~" };
                    println!("  {marker} {issue}");
                }
            }
            if report.has_structural_issues() {
                miette::bail!("structural issues found; reseed the affected topics");
            }
        }

        Commands::Info => {
            let store = CatalogStore::open(&data_dir).into_diagnostic()?;
            let topics = store.list_topics().into_diagnostic()?;
            println!("Store: {}", data_dir.display());
            println!("Topics ({}):", topics.len());
            for topic in topics {
                let (categories, sections) = store.content_counts(topic.id).into_diagnostic()?;
                let path_maps = store.path_maps_for_topic(topic.id).into_diagnostic()?;
                println!(
                    "  {} - {} categories, {} sections, {} path maps",
                    topic.slug,
                    categories,
                    sections,
                    path_maps.len()
                );
            }
        }
    }

    Ok(())
}

/// Pick the sources a command operates on: one by id, or all of them.
fn select_sources<'a>(
    registry: &'a SourceRegistry,
    source: Option<String>,
    all: bool,
) -> Result<Vec<&'a CurriculumSource>> {
    match (source, all) {
        (Some(id), false) => Ok(vec![registry.get(&id).into_diagnostic()?]),
        (None, true) => Ok(registry.list()),
        (Some(_), true) => miette::bail!("pass either a source id or --all, not both"),
        (None, false) => miette::bail!("pass a source id, or --all for every source"),
    }
}

fn build_classifier(config: &CurriculaConfig, no_suggest: bool) -> GroupClassifier {
    if no_suggest || !config.suggest.enabled {
        return GroupClassifier::pattern_only();
    }
    let suggester = HttpSuggester::new(config.suggest.client_config());
    if !suggester.probe() {
        tracing::warn!(
            url = config.suggest.base_url.as_str(),
            "suggest service unreachable; grouping will fall back to pattern rules"
        );
    }
    GroupClassifier::with_suggester(Box::new(suggester))
}
