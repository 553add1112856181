use crate::modules::upload::schema::UploadStatus;

impl UploadStatus {
    /// Ordinal used for ordering: New < In Progress < Resolved.
    pub fn rank(self) -> u8 {
        match self {
            UploadStatus::New => 0,
            UploadStatus::InProgress => 1,
            UploadStatus::Resolved => 2,
        }
    }

    /// Status after the detail page is shown. Only a staff viewer moves a
    /// New upload along; nothing else changes on view.
    pub fn after_detail_view(self, viewer_is_staff: bool) -> Option<UploadStatus> {
        match self {
            UploadStatus::New if viewer_is_staff => Some(UploadStatus::InProgress),
            _ => None,
        }
    }

    /// Status after the staff resolve action. Resolved is terminal; resolving
    /// again only replaces the admin comment.
    pub fn after_resolve(self) -> UploadStatus {
        UploadStatus::Resolved
    }

    pub fn is_terminal(self) -> bool {
        self == UploadStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered() {
        assert!(UploadStatus::New.rank() < UploadStatus::InProgress.rank());
        assert!(UploadStatus::InProgress.rank() < UploadStatus::Resolved.rank());
    }

    #[test]
    fn only_staff_views_start_work() {
        assert_eq!(UploadStatus::New.after_detail_view(true), Some(UploadStatus::InProgress));
        assert_eq!(UploadStatus::New.after_detail_view(false), None);
        assert_eq!(UploadStatus::InProgress.after_detail_view(true), None);
        assert_eq!(UploadStatus::Resolved.after_detail_view(true), None);
    }

    #[test]
    fn resolve_is_terminal_from_any_state() {
        for status in [UploadStatus::New, UploadStatus::InProgress, UploadStatus::Resolved] {
            assert!(status.after_resolve().is_terminal());
        }
        assert!(!UploadStatus::InProgress.is_terminal());
    }
}
