use crate::coerce;
use crate::models::{AuthorId, BookAuthorLink, CleanAuthor, RawAuthor};
use crate::stats::NormalizeStats;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// Every author id referenced by at least one retained book
pub fn referenced_author_ids(links: &[BookAuthorLink]) -> FxHashSet<AuthorId> {
    links
        .iter()
        .flat_map(|link| link.author_ids.iter().copied())
        .collect()
}

/// Types one raw author. `None` only when the record has no usable id.
pub fn clean_author(raw: &RawAuthor) -> Option<CleanAuthor> {
    Some(CleanAuthor {
        id: coerce::to_int(&raw.id)?,
        name: coerce::to_text(&raw.name),
        bio: coerce::to_text(&raw.bio),
        born_year: coerce::to_int(&raw.born_year),
        image_url: coerce::to_image_url(&raw.image),
    })
}

/// Cleans one category's authors and keeps only those its retained books reference.
///
/// The reference check is a semi-join on the id: a well-formed author that no surviving
/// book points at is dropped.
pub fn reconcile_authors(
    category: &str,
    raw_authors: &[RawAuthor],
    book_authors: &[BookAuthorLink],
    stats: &NormalizeStats,
) -> Vec<CleanAuthor> {
    stats.add_authors_seen(raw_authors.len() as u64);

    let mut seen_ids: FxHashSet<AuthorId> = FxHashSet::default();
    let mut candidates = Vec::with_capacity(raw_authors.len());
    let mut malformed = 0u64;
    let mut duplicates = 0u64;

    for raw in raw_authors {
        let Some(author) = clean_author(raw) else {
            malformed += 1;
            continue;
        };
        if seen_ids.insert(author.id) {
            candidates.push(author);
        } else {
            duplicates += 1;
        }
    }

    let referenced = referenced_author_ids(book_authors);
    let before = candidates.len();
    candidates.retain(|author| referenced.contains(&author.id));
    let orphans = (before - candidates.len()) as u64;

    if malformed > 0 {
        debug!(category = %category, malformed, "Skipped authors without a usable id");
    }

    stats.add_malformed_records(malformed);
    stats.add_duplicate_authors(duplicates);
    stats.add_orphan_authors(orphans);
    stats.add_authors_retained(candidates.len() as u64);

    info!(
        category = %category,
        seen = raw_authors.len(),
        retained = candidates.len(),
        orphans,
        "Category authors reconciled"
    );

    candidates
}
