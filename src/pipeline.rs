use crate::authors::reconcile_authors;
use crate::language::EnglishDetector;
use crate::models::{CategoryOutput, CleanCatalog, RawCatalog, RawCategory};
use crate::normalize::normalize_category;
use crate::source::CategoryFilter;
use crate::stats::NormalizeStats;
use crate::tags::{categorize_tags, TagDenylist};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Runtime options for a normalize run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Replaces the default denylist when non-empty
    pub excluded_tag_categories: Vec<String>,
    /// Genres to process; empty means all
    pub categories: Vec<String>,
    pub dry_run: bool,
    pub clean: bool,
}

impl PipelineConfig {
    pub fn tag_denylist(&self) -> TagDenylist {
        if self.excluded_tag_categories.is_empty() {
            TagDenylist::default()
        } else {
            TagDenylist::new(self.excluded_tag_categories.iter().cloned())
        }
    }

    pub fn category_filter(&self) -> CategoryFilter {
        CategoryFilter::new(self.categories.iter().cloned())
    }
}

/// Runs one category end to end: books first, then authors against the retained books.
pub fn process_category(
    category: &str,
    raw: &RawCategory,
    detector: &dyn EnglishDetector,
    stats: &NormalizeStats,
) -> CategoryOutput {
    let tables = normalize_category(category, &raw.books, detector, stats);
    let authors = reconcile_authors(category, &raw.authors, &tables.book_authors, stats);
    stats.inc_categories();
    CategoryOutput { tables, authors }
}

/// Normalizes a whole catalog. Categories share nothing, so they are processed in
/// parallel; the result is keyed by label and does not depend on scheduling.
pub fn run_pipeline(
    catalog: &RawCatalog,
    detector: &dyn EnglishDetector,
    denylist: &TagDenylist,
    stats: &NormalizeStats,
) -> CleanCatalog {
    stats.add_parse_failures(catalog.parse_failures.len() as u64);
    stats.add_malformed_records(catalog.malformed_rows);
    for category in &catalog.parse_failures {
        warn!(category = %category, "Category payload unreadable, emitting empty tables");
    }

    let pb = ProgressBar::new(catalog.categories.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} categories {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let categories: BTreeMap<String, CategoryOutput> = catalog
        .categories
        .par_iter()
        .map(|(label, raw)| {
            let output = process_category(label, raw, detector, stats);
            pb.inc(1);
            (label.clone(), output)
        })
        .collect();

    pb.finish_and_clear();

    let tags = categorize_tags(&catalog.tags, denylist, stats);

    info!(
        categories = categories.len(),
        tag_groups = tags.len(),
        books = stats.books_retained(),
        authors = stats.authors_retained(),
        "Pipeline complete"
    );

    CleanCatalog { categories, tags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawAuthor, RawBook, RawTag};
    use serde_json::json;

    struct EveryoneSpeaksEnglish;

    impl EnglishDetector for EveryoneSpeaksEnglish {
        fn is_english(&self, _text: &str) -> bool {
            true
        }
    }

    fn category(books: serde_json::Value, authors: serde_json::Value) -> RawCategory {
        RawCategory {
            books: serde_json::from_value::<Vec<RawBook>>(books).unwrap(),
            authors: serde_json::from_value::<Vec<RawAuthor>>(authors).unwrap(),
        }
    }

    fn catalog() -> RawCatalog {
        let mut categories = BTreeMap::new();
        categories.insert(
            "Science".to_string(),
            category(
                json!([{"id": 1, "title": "Cosmos", "contributions": [{"author_id": 10}]}]),
                json!([{"id": 10, "name": "Carl Sagan"}, {"id": 11, "name": "Nobody"}]),
            ),
        );
        categories.insert(
            "Philosophy".to_string(),
            category(
                json!([{"id": 2, "title": "Meditations", "contributions": [{"author_id": 11}]}]),
                json!([{"id": 11, "name": "Marcus Aurelius"}, {"id": 10, "name": "Carl Sagan"}]),
            ),
        );
        categories.insert("Broken".to_string(), RawCategory::default());

        RawCatalog {
            categories,
            tags: vec![RawTag {
                id: json!(1),
                name: json!("Slow"),
                category: json!("Pace"),
                ..RawTag::default()
            }],
            parse_failures: vec!["Broken".to_string()],
            malformed_rows: 0,
        }
    }

    #[test]
    fn authors_are_reconciled_per_category() {
        let stats = NormalizeStats::new();
        let clean = run_pipeline(
            &catalog(),
            &EveryoneSpeaksEnglish,
            &TagDenylist::default(),
            &stats,
        );

        let author_ids = |label: &str| -> Vec<i64> {
            clean.categories[label].authors.iter().map(|a| a.id).collect()
        };
        let science = author_ids("Science");
        let philosophy = author_ids("Philosophy");
        assert_eq!(science, vec![10]);
        assert_eq!(philosophy, vec![11]);
        assert_eq!(stats.orphan_authors(), 2);
    }

    #[test]
    fn failed_category_is_isolated() {
        let stats = NormalizeStats::new();
        let clean = run_pipeline(
            &catalog(),
            &EveryoneSpeaksEnglish,
            &TagDenylist::default(),
            &stats,
        );

        assert_eq!(clean.categories["Broken"], CategoryOutput::default());
        assert_eq!(clean.categories["Science"].tables.books.len(), 1);
        assert_eq!(stats.parse_failures(), 1);
        assert_eq!(stats.categories(), 3);
    }

    #[test]
    fn denylisted_tags_are_excluded() {
        let clean = run_pipeline(
            &catalog(),
            &EveryoneSpeaksEnglish,
            &TagDenylist::default(),
            &NormalizeStats::new(),
        );
        assert!(clean.tags.is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let raw = catalog();
        let denylist = TagDenylist::default();
        let first = run_pipeline(&raw, &EveryoneSpeaksEnglish, &denylist, &NormalizeStats::new());
        let second = run_pipeline(&raw, &EveryoneSpeaksEnglish, &denylist, &NormalizeStats::new());
        assert_eq!(first, second);
    }

    #[test]
    fn config_denylist_override_replaces_default() {
        let default = PipelineConfig::default();
        assert!(default.tag_denylist().contains("Pace"));

        let custom = PipelineConfig {
            excluded_tag_categories: vec!["Mood".to_string()],
            ..PipelineConfig::default()
        };
        let denylist = custom.tag_denylist();
        assert!(denylist.contains("Mood"));
        assert!(!denylist.contains("Pace"));
    }

    #[test]
    fn config_category_filter() {
        let config = PipelineConfig {
            categories: vec!["Science".to_string()],
            ..PipelineConfig::default()
        };
        let filter = config.category_filter();
        assert!(filter.allows("Science"));
        assert!(!filter.allows("Fiction"));
        assert!(PipelineConfig::default().category_filter().allows("Fiction"));
    }
}
