use serde::Serialize;

use crate::modules::upload::model::ListingPage;

/// What the landing route shows, depending on who is asking.
#[derive(Debug, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum HomePage {
    Landing,
    Mainpage(ListingPage),
    SiteStaff(ListingPage),
}
