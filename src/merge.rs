use crate::config::{CATEGORY_TABLES, MERGE_BUFFER_SIZE, TAGS_TABLE};
use anyhow::{bail, Context, Result};
use csv::{Reader, Writer};
use rustc_hash::FxHashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Merges the per-category files of every table into single `<table>.csv` files
pub fn merge_tables(output_dir: &Path) -> Result<()> {
    println!("Detecting per-category tables in: {}", output_dir.display());

    let book_files = category_files(output_dir, "books")?;
    if book_files.is_empty() {
        bail!(
            "No per-category book tables found in {} (expected books/<category>.csv)",
            output_dir.display()
        );
    }
    println!("  Found {} categories", book_files.len());

    for table in CATEGORY_TABLES.iter().chain(std::iter::once(&TAGS_TABLE)) {
        let files = category_files(output_dir, table)?;
        if files.is_empty() {
            println!("  Skipping {} (no files)", table);
            continue;
        }
        merge_with_dedup(output_dir, table, &files)?;
    }

    println!("Merge complete. Single CSV files ready for loading.");
    Ok(())
}

/// Sorted `.csv` files under `<output_dir>/<table>/`; empty when the directory is absent
fn category_files(output_dir: &Path, table: &str) -> Result<Vec<PathBuf>> {
    let dir = output_dir.join(table);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in
        fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenates files keeping the first row seen for each value of the first column
fn merge_with_dedup(output_dir: &Path, table: &str, files: &[PathBuf]) -> Result<()> {
    println!("  Merging {} (with deduplication)...", table);

    let output_path = output_dir.join(format!("{}.csv", table));
    let mut writer = Writer::from_writer(BufWriter::with_capacity(
        MERGE_BUFFER_SIZE,
        File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?,
    ));

    let mut seen_ids = FxHashSet::default();
    let mut header_written = false;
    let mut duplicates = 0u64;

    for path in files {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = Reader::from_reader(BufReader::new(file));

        if !header_written {
            writer.write_record(reader.headers()?)?;
            header_written = true;
        }

        for result in reader.records() {
            let record = result.with_context(|| format!("Bad row in {}", path.display()))?;
            let key = record
                .get(0)
                .with_context(|| format!("Missing key column in {}", path.display()))?;

            if seen_ids.insert(key.to_string()) {
                writer.write_record(&record)?;
            } else {
                duplicates += 1;
            }
        }
    }

    writer.flush()?;
    println!(
        "    Unique rows: {} ({} duplicates skipped)",
        seen_ids.len(),
        duplicates
    );
    Ok(())
}
