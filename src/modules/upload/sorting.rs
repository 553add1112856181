use std::cmp::Ordering;

use crate::modules::upload::schema::{UploadEntity, UploadStatus};

/// Listing order selected by the `sort_by` query parameter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    MostRecent,
    NotYetSeen,
    Priority,
    HideResolved,
}

impl SortKey {
    /// Unknown keys fall back to [`SortKey::MostRecent`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "not_yet_seen" => SortKey::NotYetSeen,
            "priority" => SortKey::Priority,
            "hide_resolved" => SortKey::HideResolved,
            _ => SortKey::MostRecent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::MostRecent => "most_recent",
            SortKey::NotYetSeen => "not_yet_seen",
            SortKey::Priority => "priority",
            SortKey::HideResolved => "hide_resolved",
        }
    }

    /// Filters and orders `uploads` for display.
    pub fn arrange(self, mut uploads: Vec<UploadEntity>) -> Vec<UploadEntity> {
        if self == SortKey::HideResolved {
            uploads.retain(|u| u.status != UploadStatus::Resolved);
        }
        uploads.sort_by(|a, b| self.compare(a, b));
        uploads
    }

    fn compare(self, a: &UploadEntity, b: &UploadEntity) -> Ordering {
        // Ids grow with insertion, so descending id is newest first.
        let newest_first = b.id.cmp(&a.id);
        let by_rank = a.status.rank().cmp(&b.status.rank());

        match self {
            SortKey::MostRecent => newest_first,
            SortKey::NotYetSeen => by_rank.then(newest_first),
            SortKey::Priority | SortKey::HideResolved => {
                b.priority.cmp(&a.priority).then(by_rank).then(newest_first)
            }
        }
    }
}
