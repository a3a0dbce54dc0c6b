use std::time::Duration;

/// Delay before `fetched` flips back to true after a create or add-member
/// action. Dialogs that close on that transition need the other reactive
/// updates to land first.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

pub const GROUPS_PATH: [&str; 2] = ["api", "groups"];

pub const GROUP_FILTER_PARAM: &str = "groupname";

/// Capacity of the mutation event channel. Slow subscribers lag past this.
pub const MUTATION_CHANNEL_CAPACITY: usize = 64;
