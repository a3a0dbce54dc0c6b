use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "groups-store", about = "Manage groups through the groups API")]
pub struct Args {
    #[arg(long, env = "GROUPS_API_HOST", required = true)]
    pub host: String,

    #[arg(long, env = "GROUPS_API_TOKEN", required = true, hide_env_values = true)]
    pub token: String,

    /// Delay before the settled flag is raised after create and add-member.
    #[arg(long, default_value_t = 10)]
    pub settle_delay_ms: u64,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every group.
    List,

    /// Show one group and its members.
    Show { group: String },

    /// Create a group and show it once created.
    Create { group: String },

    /// Add a user to a group, optionally as an admin.
    AddMember {
        group: String,
        user: String,

        #[arg(long)]
        admin: bool,
    },

    /// Remove a user from a group.
    RemoveMember { group: String, user: String },
}
