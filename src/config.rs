/// Tag categories that describe reading experience or membership rather than genre
pub const DEFAULT_TAG_CATEGORY_DENYLIST: &[&str] =
    &["Easiness", "Member", "Note", "Pace", "Queer", "Quote"];

/// Inclusive rating domain of the catalog's star scale
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

/// Raw dump file names, each optionally bzip2-compressed with a `.bz2` suffix
pub const BOOKS_DUMP: &str = "books.csv";
pub const AUTHORS_DUMP: &str = "authors.csv";
pub const TAGS_DUMP: &str = "tags.csv";

/// Buffer size for CSV readers and writers
pub const CSV_BUFFER_SIZE: usize = 128 * 1024;

/// Buffer size for merge operations
pub const MERGE_BUFFER_SIZE: usize = 256 * 1024;

/// Progress update interval (tick every N raw rows while reading dumps)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Per-category tables written by the export step, in write order
pub const CATEGORY_TABLES: &[&str] = &[
    "books",
    "book_authors",
    "book_tags",
    "book_series",
    "authors",
];

pub const TAGS_TABLE: &str = "tags";
