//! Reads the raw catalog dumps left behind by the fetch step.
//!
//! Three CSV files, each optionally bzip2-compressed (`books.csv.bz2`):
//!
//! - `books.csv` -- `genre,books`, where `books` is a JSON array with every raw book
//!   fetched for that genre. A genre may span several rows; they are concatenated.
//! - `authors.csv` -- `genre,author`, one raw author JSON object per row.
//! - `tags.csv` -- `id,tag,tag_category`, where `tag_category` is a JSON object with
//!   `category`, `id` and `created_at`.
//!
//! Extra columns (such as a leading row index) are ignored. A genre with an unreadable
//! book payload keeps an empty book list and is reported in `parse_failures`; an
//! unreadable author or tag row is skipped and counted.

use crate::config::{AUTHORS_DUMP, BOOKS_DUMP, CSV_BUFFER_SIZE, PROGRESS_INTERVAL, TAGS_DUMP};
use crate::models::{RawAuthor, RawCatalog, RawTag};
use crate::normalize::parse_books_payload;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use indicatif::ProgressBar;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct BookRow {
    genre: String,
    books: String,
}

#[derive(Deserialize)]
struct AuthorRow {
    genre: String,
    author: String,
}

#[derive(Deserialize)]
struct TagRow {
    id: String,
    tag: String,
    #[serde(default)]
    tag_category: String,
}

/// Restricts which genres are read. Empty means every genre.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    only: BTreeSet<String>,
}

impl CategoryFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, category: &str) -> bool {
        self.only.is_empty() || self.only.contains(category)
    }
}

/// Path of a dump, preferring the plain file over its `.bz2` sibling
pub fn find_dump(input_dir: &Path, name: &str) -> Option<PathBuf> {
    let plain = input_dir.join(name);
    if plain.exists() {
        return Some(plain);
    }
    let compressed = input_dir.join(format!("{}.bz2", name));
    compressed.exists().then_some(compressed)
}

fn open_dump(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open dump: {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "bz2") {
        Box::new(BufReader::with_capacity(CSV_BUFFER_SIZE, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(CSV_BUFFER_SIZE, file))
    };
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader))
}

/// Reads every dump in `input_dir` into a [`RawCatalog`]. `books.csv` is required; a
/// missing author or tag dump is logged and treated as empty.
pub fn read_catalog(input_dir: &Path, filter: &CategoryFilter) -> Result<RawCatalog> {
    let Some(books_path) = find_dump(input_dir, BOOKS_DUMP) else {
        bail!(
            "No {} (or {}.bz2) found in {}",
            BOOKS_DUMP,
            BOOKS_DUMP,
            input_dir.display()
        );
    };

    let mut catalog = RawCatalog::default();
    read_books(&books_path, filter, &mut catalog)?;

    match find_dump(input_dir, AUTHORS_DUMP) {
        Some(path) => read_authors(&path, filter, &mut catalog)?,
        None => warn!(dir = %input_dir.display(), "No author dump found"),
    }

    match find_dump(input_dir, TAGS_DUMP) {
        Some(path) => read_tags(&path, &mut catalog)?,
        None => warn!(dir = %input_dir.display(), "No tag dump found"),
    }

    info!(
        categories = catalog.categories.len(),
        tags = catalog.tags.len(),
        parse_failures = catalog.parse_failures.len(),
        malformed_rows = catalog.malformed_rows,
        "Raw catalog loaded"
    );

    Ok(catalog)
}

fn read_books(path: &Path, filter: &CategoryFilter, catalog: &mut RawCatalog) -> Result<()> {
    info!("Reading books from: {}", path.display());
    let mut reader = open_dump(path)?;
    let mut failed: BTreeSet<String> = BTreeSet::new();
    let pb = ProgressBar::new_spinner();

    for (row_num, result) in reader.deserialize::<BookRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(row = row_num, error = %e, "Skipping unreadable book row");
                catalog.malformed_rows += 1;
                continue;
            }
        };
        if !filter.allows(&row.genre) {
            continue;
        }

        let category = catalog.categories.entry(row.genre.clone()).or_default();
        match parse_books_payload(&row.genre, &row.books) {
            Some(parsed) => {
                category.books.extend(parsed.books);
                catalog.malformed_rows += parsed.malformed;
            }
            None => {
                failed.insert(row.genre);
            }
        }

        if (row_num as u64) % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }
    pb.finish_and_clear();

    // A genre with any unreadable payload is emptied rather than partially kept
    for genre in &failed {
        if let Some(category) = catalog.categories.get_mut(genre) {
            category.books.clear();
        }
    }
    catalog.parse_failures = failed.into_iter().collect();
    Ok(())
}

fn read_authors(path: &Path, filter: &CategoryFilter, catalog: &mut RawCatalog) -> Result<()> {
    info!("Reading authors from: {}", path.display());
    let mut reader = open_dump(path)?;
    let pb = ProgressBar::new_spinner();

    for (row_num, result) in reader.deserialize::<AuthorRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(row = row_num, error = %e, "Skipping unreadable author row");
                catalog.malformed_rows += 1;
                continue;
            }
        };
        if !filter.allows(&row.genre) {
            continue;
        }

        match parse_author(&row.author) {
            Some(author) => catalog
                .categories
                .entry(row.genre)
                .or_default()
                .authors
                .push(author),
            None => {
                debug!(row = row_num, genre = %row.genre, "Skipping malformed author record");
                catalog.malformed_rows += 1;
            }
        }

        if (row_num as u64) % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }
    pb.finish_and_clear();
    Ok(())
}

fn read_tags(path: &Path, catalog: &mut RawCatalog) -> Result<()> {
    info!("Reading tags from: {}", path.display());
    let mut reader = open_dump(path)?;

    for (row_num, result) in reader.deserialize::<TagRow>().enumerate() {
        match result {
            Ok(row) => catalog.tags.push(tag_from_row(row)),
            Err(e) => {
                warn!(row = row_num, error = %e, "Skipping unreadable tag row");
                catalog.malformed_rows += 1;
            }
        }
    }
    Ok(())
}

fn parse_author(payload: &str) -> Option<RawAuthor> {
    let value: Value = serde_json::from_str(payload).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// An unreadable `tag_category` leaves the tag without a label; grouping skips it later.
fn tag_from_row(row: TagRow) -> RawTag {
    let category: Value = serde_json::from_str(&row.tag_category).unwrap_or(Value::Null);
    let field = |key: &str| category.get(key).cloned().unwrap_or(Value::Null);

    RawTag {
        id: Value::String(row.id),
        name: Value::String(row.tag),
        category: field("category"),
        category_id: field("id"),
        created_at: field("created_at"),
    }
}
