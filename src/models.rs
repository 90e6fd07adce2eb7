use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub type BookId = i64;
pub type AuthorId = i64;
pub type TagId = i64;
pub type SeriesId = i64;

/// One book as returned by the catalog API. Every field is kept as raw JSON so a
/// record with odd shapes still deserializes; typing happens in `coerce`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBook {
    pub id: Value,
    pub title: Value,
    pub pages: Value,
    pub rating: Value,
    pub release_year: Value,
    pub description: Value,
    pub created_at: Value,
    pub ratings_count: Value,
    pub reviews_count: Value,
    pub editions_count: Value,
    pub lists_count: Value,
    pub users_read_count: Value,
    pub image: Value,
    pub taggings: Value,
    pub contributions: Value,
    pub book_series: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAuthor {
    pub id: Value,
    pub name: Value,
    pub bio: Value,
    pub born_year: Value,
    pub image: Value,
}

/// One row of the flat tag listing. `category` is the label tags are grouped by.
#[derive(Debug, Clone, Default)]
pub struct RawTag {
    pub id: Value,
    pub name: Value,
    pub category: Value,
    pub category_id: Value,
    pub created_at: Value,
}

/// Raw records of one catalog category (genre)
#[derive(Debug, Clone, Default)]
pub struct RawCategory {
    pub books: Vec<RawBook>,
    pub authors: Vec<RawAuthor>,
}

/// Everything the fetch layer delivers for one run
#[derive(Debug, Clone, Default)]
pub struct RawCatalog {
    pub categories: BTreeMap<String, RawCategory>,
    pub tags: Vec<RawTag>,
    /// Categories whose book payload could not be parsed (their book list is empty)
    pub parse_failures: Vec<String>,
    /// Individual author or tag rows that were skipped as malformed
    pub malformed_rows: u64,
}

/// Fixed-point decimal with one fractional digit, stored as tenths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenths(i64);

impl Tenths {
    pub fn from_tenths(tenths: i64) -> Self {
        Self(tenths)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanBook {
    pub id: BookId,
    pub title: String,
    pub pages: Option<i64>,
    pub rating: Option<Tenths>,
    pub release_year: Option<i64>,
    pub description: Option<String>,
    pub created_at: Option<NaiveDate>,
    pub ratings_count: Option<i64>,
    pub reviews_count: Option<i64>,
    pub editions_count: Option<i64>,
    pub lists_count: Option<i64>,
    pub users_read_count: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookAuthorLink {
    pub book_id: BookId,
    pub author_ids: Vec<AuthorId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTagLink {
    pub book_id: BookId,
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSeriesLink {
    pub book_id: BookId,
    pub position: Option<i64>,
    pub series_id: Option<SeriesId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanAuthor {
    pub id: AuthorId,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub born_year: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTag {
    pub id: TagId,
    pub name: Option<String>,
    pub category: String,
    pub category_id: Option<i64>,
    pub created_at: Option<NaiveDate>,
}

/// The four aligned book tables of one category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTables {
    pub books: Vec<CleanBook>,
    pub book_authors: Vec<BookAuthorLink>,
    pub book_tags: Vec<BookTagLink>,
    pub book_series: Vec<BookSeriesLink>,
}

/// Clean output of one category: its book tables plus its reconciled authors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryOutput {
    pub tables: CategoryTables,
    pub authors: Vec<CleanAuthor>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanCatalog {
    pub categories: BTreeMap<String, CategoryOutput>,
    pub tags: BTreeMap<String, Vec<CleanTag>>,
}
