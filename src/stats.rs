use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected across all categories of a normalization run
#[derive(Default)]
pub struct NormalizeStats {
    pub categories_processed: AtomicU64,
    pub parse_failures: AtomicU64,
    pub malformed_records: AtomicU64,
    pub books_seen: AtomicU64,
    pub empty_titles: AtomicU64,
    pub numeric_titles: AtomicU64,
    pub non_latin_titles: AtomicU64,
    pub non_english_titles: AtomicU64,
    pub duplicate_books: AtomicU64,
    pub books_retained: AtomicU64,
    pub series_links: AtomicU64,
    pub authors_seen: AtomicU64,
    pub duplicate_authors: AtomicU64,
    pub orphan_authors: AtomicU64,
    pub authors_retained: AtomicU64,
    pub tags_seen: AtomicU64,
    pub tags_excluded: AtomicU64,
}

impl NormalizeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_categories(&self) {
        self.categories_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_parse_failures(&self, count: u64) {
        self.parse_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_malformed_records(&self, count: u64) {
        self.malformed_records.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_books_seen(&self, count: u64) {
        self.books_seen.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_empty_titles(&self) {
        self.empty_titles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_numeric_titles(&self) {
        self.numeric_titles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_non_latin_titles(&self) {
        self.non_latin_titles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_non_english_titles(&self) {
        self.non_english_titles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicate_books(&self) {
        self.duplicate_books.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_books_retained(&self, count: u64) {
        self.books_retained.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_series_links(&self, count: u64) {
        self.series_links.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_authors_seen(&self, count: u64) {
        self.authors_seen.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_duplicate_authors(&self, count: u64) {
        self.duplicate_authors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_orphan_authors(&self, count: u64) {
        self.orphan_authors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_authors_retained(&self, count: u64) {
        self.authors_retained.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_tags_seen(&self, count: u64) {
        self.tags_seen.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_tags_excluded(&self, count: u64) {
        self.tags_excluded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn categories(&self) -> u64 {
        self.categories_processed.load(Ordering::Relaxed)
    }

    pub fn parse_failures(&self) -> u64 {
        self.parse_failures.load(Ordering::Relaxed)
    }

    pub fn malformed_records(&self) -> u64 {
        self.malformed_records.load(Ordering::Relaxed)
    }

    pub fn books_seen(&self) -> u64 {
        self.books_seen.load(Ordering::Relaxed)
    }

    pub fn empty_titles(&self) -> u64 {
        self.empty_titles.load(Ordering::Relaxed)
    }

    pub fn numeric_titles(&self) -> u64 {
        self.numeric_titles.load(Ordering::Relaxed)
    }

    pub fn non_latin_titles(&self) -> u64 {
        self.non_latin_titles.load(Ordering::Relaxed)
    }

    pub fn non_english_titles(&self) -> u64 {
        self.non_english_titles.load(Ordering::Relaxed)
    }

    pub fn duplicate_books(&self) -> u64 {
        self.duplicate_books.load(Ordering::Relaxed)
    }

    pub fn books_retained(&self) -> u64 {
        self.books_retained.load(Ordering::Relaxed)
    }

    pub fn series_links(&self) -> u64 {
        self.series_links.load(Ordering::Relaxed)
    }

    pub fn authors_seen(&self) -> u64 {
        self.authors_seen.load(Ordering::Relaxed)
    }

    pub fn duplicate_authors(&self) -> u64 {
        self.duplicate_authors.load(Ordering::Relaxed)
    }

    pub fn orphan_authors(&self) -> u64 {
        self.orphan_authors.load(Ordering::Relaxed)
    }

    pub fn authors_retained(&self) -> u64 {
        self.authors_retained.load(Ordering::Relaxed)
    }

    pub fn tags_seen(&self) -> u64 {
        self.tags_seen.load(Ordering::Relaxed)
    }

    pub fn tags_excluded(&self) -> u64 {
        self.tags_excluded.load(Ordering::Relaxed)
    }

    /// Books dropped by the title rules (empty, no Latin letters, not English)
    pub fn titles_rejected(&self) -> u64 {
        self.empty_titles() + self.non_latin_titles() + self.non_english_titles()
    }
}
