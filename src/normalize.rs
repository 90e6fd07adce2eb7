use crate::coerce;
use crate::config::{RATING_MAX, RATING_MIN};
use crate::flatten;
use crate::language::{judge_title, EnglishDetector, TitleVerdict};
use crate::models::{
    BookAuthorLink, BookId, BookSeriesLink, BookTagLink, CategoryTables, CleanBook, RawBook,
    Tenths,
};
use crate::stats::NormalizeStats;
use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Book records parsed out of one category's raw payload
#[derive(Debug, Default)]
pub struct ParsedPayload {
    pub books: Vec<RawBook>,
    /// Array entries that were not JSON objects
    pub malformed: u64,
}

/// Parses a category payload (a JSON array of book objects). Returns `None` when the
/// payload as a whole is unreadable; the caller treats that category as empty.
pub fn parse_books_payload(category: &str, payload: &str) -> Option<ParsedPayload> {
    let entries: Vec<Value> = match serde_json::from_str(payload) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(category = %category, error = %e, "Failed to parse book payload");
            return None;
        }
    };

    let mut parsed = ParsedPayload::default();
    for entry in entries {
        if !entry.is_object() {
            parsed.malformed += 1;
            continue;
        }
        match serde_json::from_value::<RawBook>(entry) {
            Ok(book) => parsed.books.push(book),
            Err(e) => {
                debug!(category = %category, error = %e, "Skipping malformed book record");
                parsed.malformed += 1;
            }
        }
    }
    Some(parsed)
}

/// Cleans the book records of one category into its four aligned tables.
///
/// Records go through, in order: empty-title removal, the title retention rule,
/// first-wins deduplication on the book id, then coercion and flattening. Records without
/// a usable id are counted as malformed and dropped at the dedup step.
pub fn normalize_category(
    category: &str,
    books: &[RawBook],
    detector: &dyn EnglishDetector,
    stats: &NormalizeStats,
) -> CategoryTables {
    stats.add_books_seen(books.len() as u64);

    let mut tables = CategoryTables::default();
    let mut seen_ids: FxHashSet<BookId> = FxHashSet::default();

    for book in books {
        let Some(title) = coerce::to_text(&book.title) else {
            stats.inc_empty_titles();
            continue;
        };

        match judge_title(&title, detector) {
            TitleVerdict::Numeric => stats.inc_numeric_titles(),
            TitleVerdict::English => {}
            TitleVerdict::NoLatinLetters => {
                stats.inc_non_latin_titles();
                continue;
            }
            TitleVerdict::NotEnglish => {
                stats.inc_non_english_titles();
                continue;
            }
        }

        let Some(id) = coerce::to_int(&book.id) else {
            debug!(category = %category, title = %title, "Skipping book without a usable id");
            stats.add_malformed_records(1);
            continue;
        };

        if !seen_ids.insert(id) {
            stats.inc_duplicate_books();
            continue;
        }

        push_book(&mut tables, id, title, book);
    }

    stats.add_books_retained(tables.books.len() as u64);
    stats.add_series_links(tables.book_series.len() as u64);

    info!(
        category = %category,
        seen = books.len(),
        retained = tables.books.len(),
        series = tables.book_series.len(),
        "Category books normalized"
    );

    tables
}

fn push_book(tables: &mut CategoryTables, id: BookId, title: String, book: &RawBook) {
    let links = flatten::flatten(book);

    tables.books.push(CleanBook {
        id,
        title,
        pages: coerce::to_int(&book.pages),
        rating: coerce::to_float_rounded1(&book.rating).filter(in_rating_domain),
        release_year: coerce::to_int(&book.release_year),
        description: coerce::to_text(&book.description),
        created_at: coerce::to_date(&book.created_at),
        ratings_count: coerce::to_int(&book.ratings_count),
        reviews_count: coerce::to_int(&book.reviews_count),
        editions_count: coerce::to_int(&book.editions_count),
        lists_count: coerce::to_int(&book.lists_count),
        users_read_count: coerce::to_int(&book.users_read_count),
        image_url: coerce::to_image_url(&book.image),
    });

    tables.book_authors.push(BookAuthorLink {
        book_id: id,
        author_ids: links.author_ids,
    });

    tables.book_tags.push(BookTagLink {
        book_id: id,
        tag_ids: links.tag_ids,
    });

    if let Some(series) = links.series {
        tables.book_series.push(BookSeriesLink {
            book_id: id,
            position: series.position,
            series_id: series.series_id,
        });
    }
}

fn in_rating_domain(rating: &Tenths) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Calls a title English only when it is on the list
    struct ListDetector(&'static [&'static str]);

    impl EnglishDetector for ListDetector {
        fn is_english(&self, text: &str) -> bool {
            self.0.iter().any(|title| *title == text)
        }
    }

    const ENGLISH: ListDetector = ListDetector(&["Dune", "Dune Messiah", "Emma"]);

    fn books(value: Value) -> Vec<RawBook> {
        serde_json::from_value(value).unwrap()
    }

    fn run(raw: &[RawBook]) -> CategoryTables {
        normalize_category("Science", raw, &ENGLISH, &NormalizeStats::new())
    }

    #[test]
    fn drops_empty_and_blank_titles() {
        let raw = books(json!([
            {"id": 1, "title": "   "},
            {"id": 2, "title": null},
            {"id": 3},
            {"id": 4, "title": " Dune "}
        ]));
        let stats = NormalizeStats::new();
        let tables = normalize_category("Science", &raw, &ENGLISH, &stats);
        assert_eq!(tables.books.len(), 1);
        assert_eq!(tables.books[0].title, "Dune");
        assert_eq!(stats.empty_titles(), 3);
    }

    #[test]
    fn retention_rule_order() {
        let raw = books(json!([
            {"id": 1, "title": "1984"},
            {"id": 2, "title": "死の組織"},
            {"id": 3, "title": "Le Petit Prince"},
            {"id": 4, "title": "Emma"}
        ]));
        let stats = NormalizeStats::new();
        let tables = normalize_category("Science", &raw, &ENGLISH, &stats);
        let ids: Vec<_> = tables.books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(stats.numeric_titles(), 1);
        assert_eq!(stats.non_latin_titles(), 1);
        assert_eq!(stats.non_english_titles(), 1);
    }

    #[test]
    fn digit_titles_in_other_scripts_are_retained() {
        let raw = books(json!([
            {"id": 1, "title": "１９８４"},
            {"id": 2, "title": "٢٠٢٠"}
        ]));
        let stats = NormalizeStats::new();
        let never = ListDetector(&[]);
        let tables = normalize_category("Science", &raw, &never, &stats);
        let ids: Vec<_> = tables.books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stats.numeric_titles(), 2);
        assert_eq!(stats.non_latin_titles(), 0);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let raw = books(json!([
            {"id": 7, "title": "Dune", "pages": 412},
            {"id": 8, "title": "Emma"},
            {"id": 7, "title": "Dune Messiah", "pages": 256}
        ]));
        let stats = NormalizeStats::new();
        let tables = normalize_category("Science", &raw, &ENGLISH, &stats);
        assert_eq!(tables.books.len(), 2);
        assert_eq!(tables.books[0].title, "Dune");
        assert_eq!(tables.books[0].pages, Some(412));
        assert_eq!(tables.book_tags.len(), 2);
        assert_eq!(stats.duplicate_books(), 1);
    }

    #[test]
    fn dedup_runs_after_title_filter() {
        // The first record with id 9 is rejected, so the second one survives
        let raw = books(json!([
            {"id": 9, "title": "Le Petit Prince"},
            {"id": 9, "title": "Emma"}
        ]));
        let tables = run(&raw);
        assert_eq!(tables.books.len(), 1);
        assert_eq!(tables.books[0].title, "Emma");
    }

    #[test]
    fn books_without_id_are_dropped() {
        let raw = books(json!([
            {"title": "Dune"},
            {"id": "abc", "title": "Emma"},
            {"id": "12", "title": "Emma"}
        ]));
        let stats = NormalizeStats::new();
        let tables = normalize_category("Science", &raw, &ENGLISH, &stats);
        assert_eq!(tables.books.len(), 1);
        assert_eq!(tables.books[0].id, 12);
        assert_eq!(stats.malformed_records(), 2);
    }

    #[test]
    fn scalars_are_coerced() {
        let raw = books(json!([{
            "id": 1,
            "title": "Dune",
            "pages": "412",
            "rating": "4.26",
            "release_year": 1965,
            "description": "  Spice.  ",
            "created_at": "2023-06-28T19:18:07.452838+00:00",
            "ratings_count": 1200,
            "reviews_count": "n/a",
            "editions_count": null,
            "lists_count": 30.0,
            "users_read_count": "9001",
            "image": {"url": "https://img/dune.jpg"}
        }]));
        let book = &run(&raw).books[0];
        assert_eq!(book.pages, Some(412));
        assert_eq!(book.rating, Some(Tenths::from_tenths(43)));
        assert_eq!(book.release_year, Some(1965));
        assert_eq!(book.description.as_deref(), Some("Spice."));
        assert_eq!(
            book.created_at,
            chrono::NaiveDate::from_ymd_opt(2023, 6, 28)
        );
        assert_eq!(book.ratings_count, Some(1200));
        assert_eq!(book.reviews_count, None);
        assert_eq!(book.editions_count, None);
        assert_eq!(book.lists_count, Some(30));
        assert_eq!(book.users_read_count, Some(9001));
        assert_eq!(book.image_url.as_deref(), Some("https://img/dune.jpg"));
    }

    #[test]
    fn out_of_domain_rating_is_missing() {
        let raw = books(json!([
            {"id": 1, "title": "Dune", "rating": 7.5},
            {"id": 2, "title": "Emma", "rating": -1},
            {"id": 3, "title": "1984", "rating": 5}
        ]));
        let tables = run(&raw);
        assert_eq!(tables.books[0].rating, None);
        assert_eq!(tables.books[1].rating, None);
        assert_eq!(tables.books[2].rating, Some(Tenths::from_tenths(50)));
    }

    #[test]
    fn link_tables_align_with_books() {
        let raw = books(json!([
            {
                "id": 1,
                "title": "Dune",
                "taggings": [{"tag_id": 10}, {"tag_id": 11}],
                "contributions": [{"author_id": 100}],
                "book_series": [
                    {"position": "2.5", "series": {"id": 500}},
                    {"position": 1, "series": {"id": 501}}
                ]
            },
            {"id": 2, "title": "Emma", "taggings": "broken"}
        ]));
        let tables = run(&raw);

        assert_eq!(
            tables.book_tags,
            vec![
                BookTagLink { book_id: 1, tag_ids: vec![10, 11] },
                BookTagLink { book_id: 2, tag_ids: vec![] },
            ]
        );
        assert_eq!(
            tables.book_authors,
            vec![
                BookAuthorLink { book_id: 1, author_ids: vec![100] },
                BookAuthorLink { book_id: 2, author_ids: vec![] },
            ]
        );
        assert_eq!(
            tables.book_series,
            vec![BookSeriesLink { book_id: 1, position: Some(3), series_id: Some(500) }]
        );
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let raw = books(json!([
            {"id": 3, "title": "Emma", "rating": 3.9, "taggings": [{"tag_id": 1}]},
            {"id": 1, "title": "1984", "book_series": [{"position": 0, "series_id": 4}]},
            {"id": 3, "title": "Dune"}
        ]));
        assert_eq!(run(&raw), run(&raw));
    }

    #[test]
    fn empty_input_gives_empty_tables() {
        assert_eq!(run(&[]), CategoryTables::default());
    }

    #[test]
    fn payload_parse_failure_is_none() {
        assert!(parse_books_payload("Science", "[{\"id\": 1,").is_none());
        assert!(parse_books_payload("Science", "{\"id\": 1}").is_none());
    }

    #[test]
    fn payload_skips_non_object_entries() {
        let parsed =
            parse_books_payload("Science", r#"[{"id": 1, "title": "Dune"}, 5, [1], null]"#)
                .unwrap();
        assert_eq!(parsed.books.len(), 1);
        assert_eq!(parsed.malformed, 3);
    }
}
