//! Shelfclean: book-catalog normalization pipeline
//!
//! Turns raw per-genre dumps fetched from a book-catalog API into clean relational tables
//! ready for loading into a relational store:
//!
//! 1. **Read Pass** -- Load `books.csv`, `authors.csv` and `tags.csv` (optionally `.bz2`)
//!    into a raw catalog keyed by genre; unreadable genres are isolated, not fatal
//! 2. **Normalize Pass** -- Per genre, in parallel: drop empty, non-English and duplicate
//!    books, flatten nested tag/author/series references, coerce scalar fields, then keep
//!    only authors referenced by a retained book
//! 3. **Tag Pass** -- Group tags by category label, excluding the configured denylist
//! 4. **Export Pass** -- Write one CSV per genre per table, and optionally merge them into
//!    single deduplicated tables
//!
//! # Key Modules
//!
//! - [`source`] -- Raw dump reader with BZ2 decompression
//! - [`language`] -- Title retention rule backed by a statistical language detector
//! - [`flatten`] -- Nested reference extraction (taggings, contributions, series)
//! - [`coerce`] -- Total conversions of loosely typed JSON scalars
//! - [`normalize`] -- Per-genre book normalization into four tables
//! - [`authors`] -- Author dedup and pruning against retained books
//! - [`tags`] -- Tag grouping with a category denylist
//! - [`pipeline`] -- Parallel per-genre driver
//! - [`export`] -- Per-genre CSV table writer
//! - [`merge`] -- Per-genre table merging with deduplication
//! - [`models`] -- Raw and clean record types
//! - [`stats`] -- Thread-safe atomic counters for run metrics
//! - [`config`] -- Constants and defaults
//!
//! # Example Usage
//!
//! ```bash
//! # Normalize every genre in a dump directory
//! shelfclean normalize -i dumps/ -o tables/
//!
//! # Combine per-genre tables into one file per table
//! shelfclean merge-tables -o tables/
//! ```

pub mod authors;
pub mod coerce;
pub mod config;
pub mod export;
pub mod flatten;
pub mod language;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod tags;
