use crate::coerce;
use crate::config::DEFAULT_TAG_CATEGORY_DENYLIST;
use crate::models::{CleanTag, RawTag};
use crate::stats::NormalizeStats;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Tag category labels excluded from the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDenylist {
    labels: BTreeSet<String>,
}

impl TagDenylist {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            labels: BTreeSet::new(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for TagDenylist {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_CATEGORY_DENYLIST.iter().copied())
    }
}

/// Groups tags by category label, dropping denylisted labels. Tags with no label or no
/// usable id cannot be placed and are skipped.
pub fn categorize_tags(
    raw_tags: &[RawTag],
    denylist: &TagDenylist,
    stats: &NormalizeStats,
) -> BTreeMap<String, Vec<CleanTag>> {
    stats.add_tags_seen(raw_tags.len() as u64);

    let mut groups: BTreeMap<String, Vec<CleanTag>> = BTreeMap::new();
    let mut excluded = 0u64;
    let mut malformed = 0u64;

    for raw in raw_tags {
        let Some(category) = coerce::to_text(&raw.category) else {
            malformed += 1;
            continue;
        };
        if denylist.contains(&category) {
            excluded += 1;
            continue;
        }
        let Some(id) = coerce::to_int(&raw.id) else {
            malformed += 1;
            continue;
        };

        groups.entry(category.clone()).or_default().push(CleanTag {
            id,
            name: coerce::to_text(&raw.name),
            category,
            category_id: coerce::to_int(&raw.category_id),
            created_at: coerce::to_date(&raw.created_at),
        });
    }

    if malformed > 0 {
        debug!(malformed, "Skipped tags without a category label or id");
    }

    stats.add_tags_excluded(excluded);
    stats.add_malformed_records(malformed);

    info!(
        seen = raw_tags.len(),
        groups = groups.len(),
        excluded,
        "Tags categorized"
    );

    groups
}
