//! Client-side cache of a groups-management API.
//!
//! [`GroupsStore`] owns the cached groups, the current group and the
//! `fetched` flag, and exposes the actions that refresh them through a
//! [`GroupsApi`] implementation such as [`HttpGroupsApi`].

pub mod api;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;

pub use api::{GroupsApi, HttpGroupsApi};
pub use error::{ActionResult, ApiError, StoreError};
pub use models::{Group, GroupMember};
pub use store::{Action, GroupsStore, Mutation, RequestState, SettlePolicy, StoreConfig, StoreState};
