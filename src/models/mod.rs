pub mod groups;
pub mod responses;

pub use groups::{Group, GroupMember};
pub use responses::{ApiResponse, GroupList, StatusMessage};
