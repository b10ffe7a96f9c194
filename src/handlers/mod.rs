pub mod admin;
pub mod documents;
pub mod funnel;
pub mod orders;
pub mod subscriptions;
pub mod users;
pub mod webhooks;

use serde::Deserialize;
use utoipa::IntoParams;

/// Common pagination query parameters.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}
