use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Store actions whose progress is tracked individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FetchAllGroups,
    FetchGroup,
    CreateGroup,
    AddGroupMember,
    RemoveGroupMember,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::FetchAllGroups => "fetch_all_groups",
            Action::FetchGroup => "fetch_group",
            Action::CreateGroup => "create_group",
            Action::AddGroupMember => "add_group_member",
            Action::RemoveGroupMember => "remove_group_member",
        };
        f.write_str(name)
    }
}

/// `Settled` is only recorded once the action's `fetched` commit has landed,
/// or was superseded by a newer action lowering the flag again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Settled,
    Failed(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }
}

/// One call of an action. Updates carrying an older ticket than the
/// action's latest call are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    action: Action,
    id: u64,
}

impl Ticket {
    pub fn action(&self) -> Action {
        self.action
    }
}

/// Latest request state per action.
#[derive(Default)]
pub struct RequestTracker {
    next_id: AtomicU64,
    states: DashMap<Action, (u64, RequestState)>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, action: Action) -> RequestState {
        self.states
            .get(&action)
            .map(|entry| entry.value().1.clone())
            .unwrap_or_default()
    }

    pub fn begin(&self, action: Action) -> Ticket {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.states.insert(action, (id, RequestState::Loading));
        Ticket { action, id }
    }

    pub fn settle(&self, ticket: Ticket) {
        self.update(ticket, RequestState::Settled);
    }

    pub fn fail(&self, ticket: Ticket, reason: String) {
        self.update(ticket, RequestState::Failed(reason));
    }

    fn update(&self, ticket: Ticket, state: RequestState) {
        if let Some(mut entry) = self.states.get_mut(&ticket.action) {
            if entry.0 == ticket.id {
                entry.1 = state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_actions_are_idle() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.get(Action::CreateGroup), RequestState::Idle);
    }

    #[test]
    fn actions_are_tracked_independently() {
        let tracker = RequestTracker::new();
        tracker.begin(Action::FetchGroup);
        let create = tracker.begin(Action::CreateGroup);
        tracker.fail(create, "Group already exists".into());

        assert!(tracker.get(Action::FetchGroup).is_loading());
        assert_eq!(
            tracker.get(Action::CreateGroup),
            RequestState::Failed("Group already exists".into())
        );
    }

    #[test]
    fn older_call_cannot_settle_a_newer_one() {
        let tracker = RequestTracker::new();
        let first = tracker.begin(Action::CreateGroup);
        let second = tracker.begin(Action::CreateGroup);

        tracker.settle(first);
        assert!(tracker.get(Action::CreateGroup).is_loading());

        tracker.settle(second);
        assert_eq!(tracker.get(Action::CreateGroup), RequestState::Settled);
    }
}
