//! `roster`: command-line access to the influencer roster service.
//!
//! ## Usage
//!
//! ```bash
//! # List everyone, or only names containing "ann"
//! roster list
//! roster list --filter ann
//!
//! # Create an influencer with two accounts
//! roster create --first-name Ann --last-name Lee \
//!     --account instagram:annlee --account tiktok:ann.lee
//!
//! # Assign influencer 3 to manager 5, then remove the assignment
//! roster assign --influencer 3 --manager 5
//! roster unassign --influencer 3
//! ```
//!
//! ## Environment Variables
//!
//! - `ROSTER_API_URL`: service base URL, default `http://localhost:3001`
//! - `RUST_LOG`: log filter, default `roster_sync=info,reqwest=warn`

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use roster_sync::{
    AccountField, AssignError, AssignmentFlow, ClientConfig, CreationFlow, DEFAULT_BASE_URL,
    HttpRosterClient, InfluencerId, ManagerId, RefreshFlag, RosterApi, RosterApp,
    SocialMediaAccount, StoreConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Influencer roster client")]
struct Args {
    /// Base URL of the roster service
    #[arg(long, global = true, env = "ROSTER_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List influencers, optionally filtered by name
    List {
        /// Case-insensitive substring of "first last"
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// List managers
    Managers,
    /// Create an influencer
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Account as platform:username; repeatable
        #[arg(long = "account")]
        accounts: Vec<SocialMediaAccount>,
    },
    /// Assign an influencer to a manager
    Assign {
        #[arg(long)]
        influencer: u64,
        #[arg(long)]
        manager: u64,
    },
    /// Remove an influencer's manager
    Unassign {
        #[arg(long)]
        influencer: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_sync=info,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig {
        base_url: args.api_url,
        request_timeout: Duration::from_secs(args.timeout_secs),
    };
    let client: Arc<dyn RosterApi> = Arc::new(HttpRosterClient::new(&config)?);

    match args.command {
        Command::List { filter } => list(client, filter).await,
        Command::Managers => {
            for manager in client.list_managers().await? {
                println!("{}\t{}", manager.id, manager.name);
            }
            Ok(())
        }
        Command::Create {
            first_name,
            last_name,
            accounts,
        } => {
            let mut form = CreationFlow::new(client, RefreshFlag::new());
            form.set_first_name(first_name);
            form.set_last_name(last_name);
            for (index, account) in accounts.into_iter().enumerate() {
                form.add_account_draft();
                form.update_account_draft(index, AccountField::Platform(account.platform))?;
                form.update_account_draft(index, AccountField::Username(account.username))?;
            }
            let created = form.submit().await.map_err(|e| e.user_message())?;
            println!("created {}\n{created}", created.id);
            Ok(())
        }
        Command::Assign {
            influencer,
            manager,
        } => assign(client, InfluencerId(influencer), Some(ManagerId(manager))).await,
        Command::Unassign { influencer } => assign(client, InfluencerId(influencer), None).await,
    }
}

/// Mount a roster scoped to `filter`, wait for the first load, and print it.
async fn list(
    client: Arc<dyn RosterApi>,
    filter: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig {
        initial_filter: filter,
        ..StoreConfig::default()
    };
    let app = RosterApp::mount(client, &config);
    let snapshot = app
        .roster()
        .wait_until(|s| s.loads_completed > 0 && !s.loading)
        .await?;
    app.shutdown().await?;

    if let Some(error) = snapshot.error {
        return Err(error.into());
    }
    for influencer in snapshot.visible.iter() {
        println!("[{}] {influencer}", influencer.id);
    }
    Ok(())
}

async fn assign(
    client: Arc<dyn RosterApi>,
    influencer: InfluencerId,
    manager: Option<ManagerId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let roster = client.list_influencers("").await?;
    let current = roster
        .iter()
        .find(|i| i.id == influencer)
        .ok_or_else(|| format!("no influencer with id {influencer}"))?;

    let mut picker = AssignmentFlow::new(client, RefreshFlag::new(), current);
    picker.select_manager(manager);
    match picker.assign().await {
        Ok(updated) => match &updated.manager {
            Some(manager) => {
                println!("{} now managed by {}", updated.full_name(), manager.name)
            }
            None => println!("{} has no manager", updated.full_name()),
        },
        Err(AssignError::NoChange) => println!("{} unchanged", current.full_name()),
        Err(e) => return Err(e.user_message().into()),
    }
    Ok(())
}
