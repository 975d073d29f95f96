#![forbid(unsafe_code)]

//! Dated revision records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point in time on the timeline.
pub type Timestamp = DateTime<Utc>;

/// A single dated record in the visualized sequence.
///
/// Revisions are produced by an external collaborator and never mutated by
/// the engine. The serialized form uses camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: u64,
    pub dataset_slug: String,
    pub created_at: Timestamp,
    pub author_name: String,
}

impl Revision {
    #[must_use]
    pub fn new(
        id: u64,
        dataset_slug: impl Into<String>,
        created_at: Timestamp,
        author_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            dataset_slug: dataset_slug.into(),
            created_at,
            author_name: author_name.into(),
        }
    }

    /// True when `created_at` lies strictly inside `(base, head)`.
    #[must_use]
    pub fn is_strictly_between(&self, base: Timestamp, head: Timestamp) -> bool {
        base < self.created_at && self.created_at < head
    }
}

/// Earliest and latest `created_at` of a revision list.
#[must_use]
pub fn extent(revisions: &[Revision]) -> Option<(Timestamp, Timestamp)> {
    let first = revisions.first()?.created_at;
    Some(
        revisions
            .iter()
            .fold((first, first), |(lo, hi), r| {
                (lo.min(r.created_at), hi.max(r.created_at))
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn strictly_between_excludes_edges() {
        let rev = Revision::new(1, "census", at(2016, 4, 1), "ada");
        assert!(rev.is_strictly_between(at(2016, 3, 1), at(2016, 5, 1)));
        assert!(!rev.is_strictly_between(at(2016, 4, 1), at(2016, 5, 1)));
        assert!(!rev.is_strictly_between(at(2016, 3, 1), at(2016, 4, 1)));
    }

    #[test]
    fn extent_of_unsorted_list() {
        let revs = vec![
            Revision::new(1, "a", at(2016, 5, 1), "x"),
            Revision::new(2, "a", at(2016, 1, 1), "y"),
            Revision::new(3, "a", at(2016, 9, 1), "z"),
        ];
        assert_eq!(extent(&revs), Some((at(2016, 1, 1), at(2016, 9, 1))));
        assert_eq!(extent(&[]), None);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let rev = Revision::new(7, "air-quality", at(2016, 3, 1), "Grace");
        let json = serde_json::to_value(&rev).unwrap();
        assert_eq!(json["datasetSlug"], "air-quality");
        assert_eq!(json["authorName"], "Grace");
        assert_eq!(json["createdAt"], "2016-03-01T00:00:00Z");

        let back: Revision = serde_json::from_value(json).unwrap();
        assert_eq!(back, rev);
    }
}
