use tokio::sync::{broadcast, watch};
use tracing::trace;

use crate::models::Group;
use crate::utils::constants::MUTATION_CHANNEL_CAPACITY;

/// Cached view of the groups API that subscribers render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub groups: Vec<Group>,
    pub current_group: Option<Group>,
    /// False while an action is in flight, true once it settled.
    pub fetched: bool,
}

/// The only ways `StoreState` changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ReceiveGroups(Vec<Group>),
    SetCurrentGroup(Option<Group>),
    MarkFetching,
    MarkFetched,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::ReceiveGroups(_) => "receive_groups",
            Mutation::SetCurrentGroup(_) => "set_current_group",
            Mutation::MarkFetching => "fetching",
            Mutation::MarkFetched => "fetched",
        }
    }

    fn apply(&self, state: &mut StoreState) {
        match self {
            Mutation::ReceiveGroups(groups) => state.groups = groups.clone(),
            Mutation::SetCurrentGroup(group) => state.current_group = group.clone(),
            Mutation::MarkFetching => state.fetched = false,
            Mutation::MarkFetched => state.fetched = true,
        }
    }
}

/// Holds the state and fans every committed mutation out to subscribers.
pub struct StateCell {
    state: watch::Sender<StoreState>,
    events: broadcast::Sender<Mutation>,
}

impl StateCell {
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::default());
        let (events, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self { state, events }
    }

    pub fn commit(&self, mutation: Mutation) {
        self.state.send_modify(|state| mutation.apply(state));
        trace!(mutation = mutation.name(), "committed");
        // No subscribers is fine.
        let _ = self.events.send(mutation);
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    pub fn is_fetched(&self) -> bool {
        self.state.borrow().fetched
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Mutation> {
        self.events.subscribe()
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_unsettled() {
        let cell = StateCell::new();
        let state = cell.snapshot();
        assert!(state.groups.is_empty());
        assert!(state.current_group.is_none());
        assert!(!state.fetched);
    }

    #[test]
    fn receive_groups_replaces_instead_of_merging() {
        let cell = StateCell::new();
        cell.commit(Mutation::ReceiveGroups(vec![Group::new("a"), Group::new("b")]));
        cell.commit(Mutation::ReceiveGroups(vec![Group::new("c")]));
        assert_eq!(cell.snapshot().groups, vec![Group::new("c")]);
    }

    #[test]
    fn commits_reach_watchers_and_event_subscribers() {
        let cell = StateCell::new();
        let watcher = cell.subscribe();
        let mut events = cell.events();

        cell.commit(Mutation::SetCurrentGroup(Some(Group::new("eng"))));
        cell.commit(Mutation::MarkFetched);

        assert!(watcher.has_changed().expect("sender alive"));
        assert_eq!(
            watcher.borrow().current_group.as_ref().map(|g| g.groupname.as_str()),
            Some("eng")
        );
        assert_eq!(events.try_recv().map(|m| m.name()), Ok("set_current_group"));
        assert_eq!(events.try_recv(), Ok(Mutation::MarkFetched));
    }
}
