//! # Transform
//!
//! Maps fetched gists to Pipedrive activities.
//!
//! ## Field Mapping
//! ```text
//! Gist                      →  Activity
//! ─────────────────────────────────────────────
//! id                        →  subject
//! html_url, owner.login     →  note ("<html_url>; Owner: <login>")
//! (constant)                →  type = "Task"
//! (constant)                →  done = 0
//! ```
//!
//! One activity per gist, in [`SourceBatch::flatten`] order. The mapping is
//! total; deserialization already guarantees the required fields.

use crate::types::{Activity, Gist, SourceBatch};
use crate::{ACTIVITY_TYPE, OWNER_SEPARATOR};

/// Transforms a whole batch, preserving entity-then-record order.
pub fn transform(batch: &SourceBatch) -> Vec<Activity> {
    batch.flatten().map(to_activity).collect()
}

/// Maps a single gist to its activity.
pub fn to_activity(gist: &Gist) -> Activity {
    Activity {
        subject: gist.id.clone(),
        note: format!("{}{}{}", gist.html_url, OWNER_SEPARATOR, gist.owner_login()),
        activity_type: ACTIVITY_TYPE.to_string(),
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityRecords;

    fn sample_batch() -> SourceBatch {
        SourceBatch::from(vec![
            EntityRecords::new(
                "a",
                vec![
                    Gist::new("a1", "http://x/a1", "a"),
                    Gist::new("a2", "http://x/a2", "a"),
                ],
            ),
            EntityRecords::empty("b"),
            EntityRecords::new("c", vec![Gist::new("c1", "http://x/c1", "c")]),
        ])
    }

    #[test]
    fn test_single_gist_mapping() {
        let activity = to_activity(&Gist::new("g1", "http://x/g1", "a"));

        assert_eq!(activity.subject, "g1");
        assert_eq!(activity.note, "http://x/g1; Owner: a");
        assert_eq!(activity.activity_type, "Task");
        assert!(!activity.done);
    }

    #[test]
    fn test_one_activity_per_gist_in_order() {
        let activities = transform(&sample_batch());

        let subjects: Vec<&str> = activities.iter().map(|a| a.subject.as_str()).collect();
        assert_eq!(subjects, vec!["a1", "a2", "c1"]);
        assert_eq!(activities[2].note, "http://x/c1; Owner: c");
    }

    #[test]
    fn test_transform_is_deterministic() {
        let batch = sample_batch();
        assert_eq!(transform(&batch), transform(&batch));
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        assert!(transform(&SourceBatch::new()).is_empty());
        assert!(transform(&SourceBatch::from(vec![EntityRecords::empty("a")])).is_empty());
    }

    #[test]
    fn test_note_uses_owner_not_entity() {
        // A gist listed under one user may be owned by another login casing
        let batch = SourceBatch::from(vec![EntityRecords::new(
            "octocat",
            vec![Gist::new("g9", "http://x/g9", "OctoCat")],
        )]);
        assert_eq!(transform(&batch)[0].note, "http://x/g9; Owner: OctoCat");
    }
}
