use serde::Deserialize;

use crate::models::groups::Group;

/// `{ success, result }` envelope wrapping every groups API reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,

    pub result: T,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupList {
    #[serde(default)]
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub message: Option<String>,
}

impl<T: Default> ApiResponse<T> {
    pub fn ok() -> Self {
        Self {
            success: true,
            result: T::default(),
        }
    }
}

impl ApiResponse<StatusMessage> {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: StatusMessage {
                message: Some(message.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_success_defaults_to_true() {
        let resp: ApiResponse<GroupList> =
            serde_json::from_str(r#"{ "result": { "groups": [{ "groupname": "ops" }] } }"#)
                .expect("valid envelope");
        assert!(resp.success);
        assert_eq!(resp.result.groups[0].groupname, "ops");
    }

    #[test]
    fn rejection_carries_message() {
        let resp: ApiResponse<StatusMessage> = serde_json::from_str(
            r#"{ "success": false, "result": { "message": "Group already exists" } }"#,
        )
        .expect("valid envelope");
        assert!(!resp.success);
        assert_eq!(resp.result.message.as_deref(), Some("Group already exists"));
    }
}
