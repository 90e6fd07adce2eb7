//! Pulls the one-to-many relationships out of a nested book record.
//!
//! The catalog API returns these relationships in two shapes depending on the query: a
//! flat foreign key (`{"tag_id": 5}`) or a nested object (`{"tag": {"id": 5}}`). Both
//! are accepted. Entries without a usable identifier are skipped; a field that is
//! missing or isn't a list gives an empty list.

use crate::coerce;
use crate::models::{AuthorId, RawBook, SeriesId, TagId};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesMembership {
    pub position: Option<i64>,
    pub series_id: Option<SeriesId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedLinks {
    pub tag_ids: Vec<TagId>,
    pub author_ids: Vec<AuthorId>,
    pub series: Option<SeriesMembership>,
}

pub fn flatten(book: &RawBook) -> FlattenedLinks {
    FlattenedLinks {
        tag_ids: tag_ids(&book.taggings),
        author_ids: author_ids(&book.contributions),
        series: first_series(&book.book_series),
    }
}

pub fn tag_ids(taggings: &Value) -> Vec<TagId> {
    linked_ids(taggings, "tag_id", "tag")
}

pub fn author_ids(contributions: &Value) -> Vec<AuthorId> {
    linked_ids(contributions, "author_id", "author")
}

/// First membership in source order; the catalog lists a book's primary series first
pub fn first_series(book_series: &Value) -> Option<SeriesMembership> {
    let first = book_series.as_array()?.first()?;
    Some(SeriesMembership {
        position: first.get("position").and_then(coerce::to_rounded_int),
        series_id: linked_id(first, "series_id", "series"),
    })
}

fn linked_ids(list: &Value, flat_key: &str, nested_key: &str) -> Vec<i64> {
    match list.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| linked_id(item, flat_key, nested_key))
            .collect(),
        None => Vec::new(),
    }
}

fn linked_id(item: &Value, flat_key: &str, nested_key: &str) -> Option<i64> {
    item.get(flat_key)
        .and_then(coerce::to_int)
        .or_else(|| {
            item.get(nested_key)
                .and_then(|nested| nested.get("id"))
                .and_then(coerce::to_int)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book(value: Value) -> RawBook {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flat_and_nested_shapes() {
        let raw = book(json!({
            "taggings": [{"tag_id": 1}, {"tag": {"id": 2}}],
            "contributions": [{"author_id": 10}, {"author": {"id": "11"}}]
        }));
        let links = flatten(&raw);
        assert_eq!(links.tag_ids, vec![1, 2]);
        assert_eq!(links.author_ids, vec![10, 11]);
        assert_eq!(links.series, None);
    }

    #[test]
    fn order_and_duplicates_preserved() {
        let raw = book(json!({"taggings": [{"tag_id": 3}, {"tag_id": 1}, {"tag_id": 3}]}));
        assert_eq!(flatten(&raw).tag_ids, vec![3, 1, 3]);
    }

    #[test]
    fn missing_or_non_list_fields_are_empty() {
        let raw = book(json!({"taggings": null, "contributions": {"author_id": 1}}));
        let links = flatten(&raw);
        assert!(links.tag_ids.is_empty());
        assert!(links.author_ids.is_empty());
        assert!(flatten(&RawBook::default()).tag_ids.is_empty());
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let raw = book(json!({"taggings": [{"tag_id": null}, {"tag": {}}, 7, {"tag_id": 4}]}));
        assert_eq!(flatten(&raw).tag_ids, vec![4]);
    }

    #[test]
    fn only_first_series_kept() {
        let raw = book(json!({"book_series": [
            {"position": 2, "series": {"id": 100}},
            {"position": 9, "series": {"id": 200}}
        ]}));
        assert_eq!(
            flatten(&raw).series,
            Some(SeriesMembership {
                position: Some(2),
                series_id: Some(100),
            })
        );
    }

    #[test]
    fn series_position_is_coerced() {
        let fractional = first_series(&json!([{"position": "2.5", "series_id": 5}]));
        assert_eq!(fractional.unwrap().position, Some(3));

        let unknown = first_series(&json!([{"position": "N/A", "series_id": 5}]));
        assert_eq!(unknown.unwrap().position, None);

        let zero = first_series(&json!([{"position": 0, "series_id": 5}]));
        assert_eq!(zero.unwrap().position, Some(0));
    }

    #[test]
    fn empty_series_list_has_no_membership() {
        assert_eq!(first_series(&json!([])), None);
        assert_eq!(first_series(&Value::Null), None);
    }
}
