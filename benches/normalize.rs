//! Benchmarks for taxonomy normalization and slug allocation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use curricula::grouping::GroupClassifier;
use curricula::normalize::Normalizer;
use curricula::slug::SlugAllocator;
use curricula::taxonomy::Taxonomy;

/// A synthetic 20-group / 100-category / 1000-section taxonomy.
fn synthetic_taxonomy() -> Taxonomy {
    let mut groups = Vec::new();
    for g in 0..20 {
        let mut categories = Vec::new();
        for c in 0..5 {
            let sections: Vec<String> = (0..10)
                .map(|s| format!("\"Lesson {g} {c} {s} on Advanced Performance\""))
                .collect();
            categories.push(format!("\"{g:02}_chapter_{c}\": [{}]", sections.join(",")));
        }
        groups.push(format!("\"{g:02}_module_{g}\": {{{}}}", categories.join(",")));
    }
    Taxonomy::parse(&format!("{{{}}}", groups.join(","))).unwrap()
}

fn bench_flatten(c: &mut Criterion) {
    let taxonomy = synthetic_taxonomy();
    let classifier = GroupClassifier::pattern_only();
    let normalizer = Normalizer::new(&classifier);

    c.bench_function("flatten_1000_sections", |bench| {
        bench.iter(|| black_box(normalizer.flatten(&taxonomy, "bench")))
    });
}

fn bench_slug_allocation(c: &mut Criterion) {
    let titles: Vec<String> = (0..1000).map(|i| format!("Lesson {} Overview", i % 50)).collect();

    c.bench_function("allocate_1000_colliding_slugs", |bench| {
        bench.iter(|| {
            let mut alloc = SlugAllocator::new();
            for title in &titles {
                black_box(alloc.allocate(title));
            }
        })
    });
}

criterion_group!(benches, bench_flatten, bench_slug_allocation);
criterion_main!(benches);
