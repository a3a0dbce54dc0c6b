use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Group record as served by the groups API.
///
/// Only `groupname` and the member list are read by the store. Anything else
/// the server sends is carried along in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub groupname: String,

    #[serde(default, alias = "users")]
    pub members: Vec<GroupMember>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub username: String,

    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl Group {
    pub fn new(groupname: impl Into<String>) -> Self {
        Self {
            groupname: groupname.into(),
            members: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_member(mut self, username: impl Into<String>, is_admin: bool) -> Self {
        self.members.push(GroupMember {
            username: username.into(),
            is_admin,
        });
        self
    }

    pub fn admins(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| m.is_admin)
    }
}
