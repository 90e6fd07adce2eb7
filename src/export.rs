//! Writes clean tables as CSV for the load step.
//!
//! Layout: `<out>/<table>/<slug>.csv`, one file per category and table, plus
//! `<out>/tags/<slug>.csv` per tag category. Missing values are empty fields and id lists
//! are array literals (`{1,2,3}`) that load directly into an array column.

use crate::config::{CATEGORY_TABLES, CSV_BUFFER_SIZE, TAGS_TABLE};
use crate::models::{
    BookAuthorLink, BookSeriesLink, BookTagLink, CategoryOutput, CleanAuthor, CleanBook,
    CleanCatalog, CleanTag,
};
use anyhow::{Context, Result};
use csv::Writer;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

pub const BOOKS_HEADER: &[&str] = &[
    "book_id",
    "title",
    "pages",
    "rating",
    "release_year",
    "description",
    "created_at",
    "ratings_count",
    "reviews_count",
    "editions_count",
    "lists_count",
    "users_read_count",
    "book_image",
];
pub const BOOK_AUTHORS_HEADER: &[&str] = &["book_id", "author_ids"];
pub const BOOK_TAGS_HEADER: &[&str] = &["book_id", "tag_ids"];
pub const BOOK_SERIES_HEADER: &[&str] = &["book_id", "position", "series_id"];
pub const AUTHORS_HEADER: &[&str] = &["author_id", "name", "bio", "born_year", "author_image"];
pub const TAGS_HEADER: &[&str] = &["tag_id", "tag_name", "category", "category_id", "created_at"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub files: u64,
    pub rows: u64,
}

/// Lowercase ASCII alphanumerics with every other run of characters collapsed to `_`
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_sep = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}

/// Assigns each label a file stem, suffixing `_2`, `_3`, ... when two labels share a slug
pub fn unique_slugs<'a, I>(labels: I) -> BTreeMap<&'a str, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut slugs = BTreeMap::new();
    for label in labels {
        let base = slugify(label);
        let mut slug = base.clone();
        let mut n = 2;
        while !used.insert(slug.clone()) {
            slug = format!("{}_{}", base, n);
            n += 1;
        }
        slugs.insert(label, slug);
    }
    slugs
}

/// Array literal for an id list, e.g. `{3,1,4}`
pub fn id_array(ids: &[i64]) -> String {
    let mut out = String::with_capacity(2 + ids.len() * 8);
    let mut buf = itoa::Buffer::new();
    out.push('{');
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(buf.format(*id));
    }
    out.push('}');
    out
}

fn field<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn int(value: i64) -> String {
    itoa::Buffer::new().format(value).to_string()
}

fn book_row(book: &CleanBook) -> Vec<String> {
    vec![
        int(book.id),
        book.title.clone(),
        field(&book.pages),
        field(&book.rating),
        field(&book.release_year),
        field(&book.description),
        field(&book.created_at),
        field(&book.ratings_count),
        field(&book.reviews_count),
        field(&book.editions_count),
        field(&book.lists_count),
        field(&book.users_read_count),
        field(&book.image_url),
    ]
}

fn book_author_row(link: &BookAuthorLink) -> Vec<String> {
    vec![int(link.book_id), id_array(&link.author_ids)]
}

fn book_tag_row(link: &BookTagLink) -> Vec<String> {
    vec![int(link.book_id), id_array(&link.tag_ids)]
}

fn book_series_row(link: &BookSeriesLink) -> Vec<String> {
    vec![int(link.book_id), field(&link.position), field(&link.series_id)]
}

fn author_row(author: &CleanAuthor) -> Vec<String> {
    vec![
        int(author.id),
        field(&author.name),
        field(&author.bio),
        field(&author.born_year),
        field(&author.image_url),
    ]
}

fn tag_row(tag: &CleanTag) -> Vec<String> {
    vec![
        int(tag.id),
        field(&tag.name),
        tag.category.clone(),
        field(&tag.category_id),
        field(&tag.created_at),
    ]
}

fn write_table<I>(path: &Path, header: &[&str], rows: I) -> Result<u64>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = Writer::from_writer(BufWriter::with_capacity(CSV_BUFFER_SIZE, file));
    writer.write_record(header)?;

    let mut count = 0u64;
    for row in rows {
        writer.write_record(&row)?;
        count += 1;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(count)
}

fn write_category(
    output_dir: &Path,
    slug: &str,
    output: &CategoryOutput,
    summary: &mut ExportSummary,
) -> Result<()> {
    let file_name = format!("{}.csv", slug);
    let tables = &output.tables;

    for table in CATEGORY_TABLES {
        let path = output_dir.join(table).join(&file_name);
        let rows = match *table {
            "books" => write_table(&path, BOOKS_HEADER, tables.books.iter().map(book_row))?,
            "book_authors" => write_table(
                &path,
                BOOK_AUTHORS_HEADER,
                tables.book_authors.iter().map(book_author_row),
            )?,
            "book_tags" => write_table(
                &path,
                BOOK_TAGS_HEADER,
                tables.book_tags.iter().map(book_tag_row),
            )?,
            "book_series" => write_table(
                &path,
                BOOK_SERIES_HEADER,
                tables.book_series.iter().map(book_series_row),
            )?,
            "authors" => write_table(&path, AUTHORS_HEADER, output.authors.iter().map(author_row))?,
            other => unreachable!("unknown category table: {}", other),
        };
        summary.files += 1;
        summary.rows += rows;
    }
    Ok(())
}

/// Empties one table's directory and drops its merged file, so no earlier run survives
fn reset_table(output_dir: &Path, table: &str) -> Result<()> {
    let dir = output_dir.join(table);
    if dir.exists() {
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to clear table directory: {}", dir.display()))?;
    }
    let merged = output_dir.join(format!("{}.csv", table));
    if merged.exists() {
        fs::remove_file(&merged)
            .with_context(|| format!("Failed to remove stale table: {}", merged.display()))?;
    }
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}

/// Writes every table of a clean catalog under `output_dir`, replacing whatever an
/// earlier run left there
pub fn write_catalog(catalog: &CleanCatalog, output_dir: &Path) -> Result<ExportSummary> {
    for table in CATEGORY_TABLES.iter().chain(std::iter::once(&TAGS_TABLE)) {
        reset_table(output_dir, table)?;
    }

    let mut summary = ExportSummary::default();

    let category_slugs = unique_slugs(catalog.categories.keys().map(String::as_str));
    for (label, output) in &catalog.categories {
        let slug = &category_slugs[label.as_str()];
        write_category(output_dir, slug, output, &mut summary)?;
        debug!(category = %label, slug = %slug, "Category tables written");
    }

    let tag_slugs = unique_slugs(catalog.tags.keys().map(String::as_str));
    for (label, tags) in &catalog.tags {
        let path = output_dir
            .join(TAGS_TABLE)
            .join(format!("{}.csv", tag_slugs[label.as_str()]));
        summary.rows += write_table(&path, TAGS_HEADER, tags.iter().map(tag_row))?;
        summary.files += 1;
    }

    info!(
        files = summary.files,
        rows = summary.rows,
        dir = %output_dir.display(),
        "Clean tables written"
    );

    Ok(summary)
}
