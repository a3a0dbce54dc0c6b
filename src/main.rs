mod args;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use groups_store::{Group, GroupsStore, HttpGroupsApi, StoreConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    groups_store::logging::init(&args.log_level)?;

    let api = HttpGroupsApi::new(&args.host, args.token.clone()).context("could not set up the groups API client")?;
    let config = StoreConfig::with_settle_delay(Duration::from_millis(args.settle_delay_ms));
    let store = GroupsStore::new(Arc::new(api), config);

    match &args.command {
        Command::List => {
            let groups = store
                .fetch_all_groups()
                .await
                .context("could not list groups")?;
            info!("found {} groups", groups.len());
            for group in &groups {
                print_group(group);
            }
        }
        Command::Show { group } => {
            let group = store
                .fetch_group(group)
                .await
                .with_context(|| format!("could not load group {group}"))?;
            print_group(&group);
        }
        Command::Create { group } => {
            store
                .create_group(group)
                .await
                .with_context(|| format!("could not create group {group}"))?;
        }
        Command::AddMember { group, user, admin } => {
            store
                .add_group_member(group, user, *admin)
                .await
                .with_context(|| format!("could not add {user} to {group}"))?;
        }
        Command::RemoveMember { group, user } => {
            store
                .remove_group_member(group, user)
                .await
                .with_context(|| format!("could not remove {user} from {group}"))?;
        }
    }

    store.wait_settled().await;
    if let Some(current) = store.snapshot().current_group {
        if !matches!(args.command, Command::Show { .. }) {
            print_group(&current);
        }
    }
    Ok(())
}

fn print_group(group: &Group) {
    println!("{}", group.groupname);
    for member in &group.members {
        let role = if member.is_admin { "admin" } else { "member" };
        println!("  {} ({})", member.username, role);
    }
}
