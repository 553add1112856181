//! Who may see and change an upload.

use crate::modules::upload::schema::UploadEntity;
use crate::utils::Claims;

fn is_owner(viewer: &Claims, upload: &UploadEntity) -> bool {
    upload.owner_id == Some(viewer.sub)
}

/// Owner or any staff member. Ownerless uploads are therefore staff-only.
pub fn can_view(viewer: Option<&Claims>, upload: &UploadEntity) -> bool {
    viewer.is_some_and(|v| is_owner(v, upload) || v.is_staff())
}

/// Priority follows the same rule as viewing.
pub fn can_change_priority(viewer: Option<&Claims>, upload: &UploadEntity) -> bool {
    can_view(viewer, upload)
}

pub fn can_resolve(viewer: Option<&Claims>) -> bool {
    viewer.is_some_and(Claims::is_staff)
}

/// Refuses anonymous viewers and staff acting on someone else's upload.
/// Signed-in non-staff users are not checked for ownership; this is the
/// deployed behaviour and is kept until product intent says otherwise.
pub fn can_delete(viewer: Option<&Claims>, upload: &UploadEntity) -> bool {
    match viewer {
        None => false,
        Some(v) => is_owner(v, upload) || !v.is_staff(),
    }
}
