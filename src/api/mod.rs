mod http;

use async_trait::async_trait;

pub use http::HttpGroupsApi;

use crate::error::ApiError;
use crate::models::{ApiResponse, GroupList, StatusMessage};

/// Remote groups-management API the store talks to.
#[async_trait]
pub trait GroupsApi: Send + Sync {
    /// List groups, optionally filtered down to a single group name.
    async fn get_groups(&self, filter: Option<&str>) -> Result<GroupList, ApiError>;

    async fn add_new_group(&self, groupname: &str) -> Result<ApiResponse<StatusMessage>, ApiError>;

    async fn add_group_user(
        &self,
        group_name: &str,
        user_name: &str,
        is_admin: bool,
    ) -> Result<ApiResponse<StatusMessage>, ApiError>;

    async fn remove_group_user(
        &self,
        group_name: &str,
        user_name: &str,
    ) -> Result<ApiResponse<StatusMessage>, ApiError>;
}
