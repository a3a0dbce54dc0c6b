//! Cached view of the groups API plus the actions that refresh it.
//!
//! Every change goes through a [`Mutation`], which is applied to the watched
//! [`StoreState`] and published on the event stream. Actions flip `fetched`
//! to false while they work and hand it back through a [`SettlePolicy`].

mod request;
mod settle;
mod state;


use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, instrument, warn};

pub use request::{Action, RequestState};
pub use settle::SettlePolicy;
pub use state::{Mutation, StoreState};

use crate::api::GroupsApi;
use crate::error::{ActionResult, StoreError};
use crate::models::{ApiResponse, Group, StatusMessage};
use crate::utils::constants::DEFAULT_SETTLE_DELAY;
use request::{RequestTracker, Ticket};
use settle::Settler;
use state::StateCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub create_group_settle: SettlePolicy,
    pub add_member_settle: SettlePolicy,
    pub remove_member_settle: SettlePolicy,
}

impl StoreConfig {
    /// Same delay for create and add-member, immediate for remove-member.
    pub fn with_settle_delay(delay: std::time::Duration) -> Self {
        Self {
            create_group_settle: SettlePolicy::Debounced(delay),
            add_member_settle: SettlePolicy::Debounced(delay),
            remove_member_settle: SettlePolicy::Immediate,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_settle_delay(DEFAULT_SETTLE_DELAY)
    }
}

pub struct GroupsStore {
    api: Arc<dyn GroupsApi>,
    cell: Arc<StateCell>,
    requests: Arc<RequestTracker>,
    settler: Settler,
    config: StoreConfig,
}

impl GroupsStore {
    pub fn new(api: Arc<dyn GroupsApi>, config: StoreConfig) -> Self {
        Self {
            api,
            cell: Arc::new(StateCell::new()),
            requests: Arc::new(RequestTracker::new()),
            settler: Settler::new(),
            config,
        }
    }

    pub fn snapshot(&self) -> StoreState {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.cell.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Mutation> {
        self.cell.events()
    }

    pub fn request_state(&self, action: Action) -> RequestState {
        self.requests.get(action)
    }

    /// Resolves once `fetched` is true, including any pending delayed settle.
    pub async fn wait_settled(&self) {
        let mut watcher = self.cell.subscribe();
        // The sender lives in `self.cell`, so this cannot see a closed channel.
        let _ = watcher.wait_for(|state| state.fetched).await;
    }

    pub fn receive_groups(&self, groups: Vec<Group>) {
        self.cell.commit(Mutation::ReceiveGroups(groups));
    }

    pub fn set_current_group(&self, group: Option<Group>) {
        self.cell.commit(Mutation::SetCurrentGroup(group));
    }

    /// Also drops a pending delayed settle so it cannot flip this new
    /// in-flight state back to fetched.
    pub fn mark_fetching(&self) {
        self.settler.mark_fetching(&self.cell);
    }

    pub fn mark_fetched(&self) {
        self.cell.commit(Mutation::MarkFetched);
    }

    #[instrument(skip(self))]
    pub async fn fetch_all_groups(&self) -> Result<Vec<Group>, StoreError> {
        let ticket = self.begin(Action::FetchAllGroups, true);
        let outcome = async {
            let list = self.api.get_groups(None).await?;
            info!(count = list.groups.len(), "received groups");
            self.receive_groups(list.groups.clone());
            self.settle(SettlePolicy::Immediate, ticket);
            Ok::<_, StoreError>(list.groups)
        }
        .await;
        self.finish(ticket, true, outcome)
    }

    #[instrument(skip(self))]
    pub async fn fetch_group(&self, groupname: &str) -> Result<Group, StoreError> {
        let ticket = self.begin(Action::FetchGroup, true);
        let outcome = async {
            let group = self.load_group(groupname).await?;
            self.settle(SettlePolicy::Immediate, ticket);
            Ok::<_, StoreError>(group)
        }
        .await;
        self.finish(ticket, true, outcome)
    }

    #[instrument(skip(self))]
    pub async fn create_group(&self, groupname: &str) -> ActionResult {
        let ticket = self.begin(Action::CreateGroup, true);
        let outcome = async {
            let response = self.api.add_new_group(groupname).await?;
            if !response.success {
                return Err(rejection(response, || format!("could not create group {groupname}")));
            }
            info!("group created");
            self.load_group(groupname).await?;
            self.mark_fetching();
            self.settle(self.config.create_group_settle, ticket);
            Ok(())
        }
        .await;
        self.finish(ticket, true, outcome)
    }

    #[instrument(skip(self))]
    pub async fn add_group_member(&self, group_name: &str, user_name: &str, is_admin: bool) -> ActionResult {
        let ticket = self.begin(Action::AddGroupMember, false);
        let outcome = async {
            let response = self.api.add_group_user(group_name, user_name, is_admin).await?;
            if !response.success {
                return Err(rejection(response, || {
                    format!("could not add {user_name} to {group_name}")
                }));
            }
            let refresh = self.refresh_key(group_name);
            self.load_group(&refresh).await?;
            self.mark_fetching();
            self.settle(self.config.add_member_settle, ticket);
            Ok(())
        }
        .await;
        self.finish(ticket, false, outcome)
    }

    /// Refreshes even when the API refused the removal; the refusal is still
    /// reported back.
    #[instrument(skip(self))]
    pub async fn remove_group_member(&self, group_name: &str, user_name: &str) -> ActionResult {
        let ticket = self.begin(Action::RemoveGroupMember, true);
        let outcome = async {
            let response = self.api.remove_group_user(group_name, user_name).await?;
            let refresh = self.refresh_key(group_name);
            self.load_group(&refresh).await?;
            self.settle(self.config.remove_member_settle, ticket);
            if !response.success {
                return Err(rejection(response, || {
                    format!("could not remove {user_name} from {group_name}")
                }));
            }
            Ok(())
        }
        .await;
        self.finish(ticket, true, outcome)
    }

    /// Fetch one group by name and make it current. The filtered list also
    /// replaces `groups`.
    async fn load_group(&self, groupname: &str) -> Result<Group, StoreError> {
        let list = self.api.get_groups(Some(groupname)).await?;
        let Some(group) = list.groups.first().cloned() else {
            return Err(StoreError::GroupNotFound(groupname.to_string()));
        };
        self.set_current_group(Some(group.clone()));
        self.receive_groups(list.groups);
        Ok(group)
    }

    fn refresh_key(&self, fallback: &str) -> String {
        self.cell
            .snapshot()
            .current_group
            .map(|group| group.groupname)
            .unwrap_or_else(|| fallback.to_string())
    }

    fn begin(&self, action: Action, lowers_flag: bool) -> Ticket {
        let ticket = self.requests.begin(action);
        if lowers_flag {
            self.mark_fetching();
        }
        ticket
    }

    /// Raise `fetched` and record the call as settled once the commit lands.
    fn settle(&self, policy: SettlePolicy, ticket: Ticket) {
        let requests = Arc::clone(&self.requests);
        self.settler
            .settle(policy, &self.cell, move || requests.settle(ticket));
    }

    fn finish<T>(&self, ticket: Ticket, lowered_flag: bool, outcome: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = &outcome {
            warn!(action = %ticket.action(), error = %err, "action failed");
            self.requests.fail(ticket, err.reason());
            if lowered_flag && !self.cell.is_fetched() {
                self.settler.settle(SettlePolicy::Immediate, &self.cell, || {});
            }
        }
        outcome
    }
}

fn rejection(response: ApiResponse<StatusMessage>, fallback: impl FnOnce() -> String) -> StoreError {
    StoreError::rejected(response.result.message.unwrap_or_else(fallback))
}
