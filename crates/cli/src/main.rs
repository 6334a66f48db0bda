//! Stowage CLI: JSON request in, JSON response out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stowage::engine::api::{
    self, ErrorResponse, InventorySnapshot, PlaceRequest, PlacementRequest, RearrangementRequest,
    RetrievalRequest, RetrieveRequest, ReturnPlanRequest, SimulationRequest, UndockingRequest,
};
use stowage_cli::{load_config, read_request, StateStore};

#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Cargo placement, retrieval and rearrangement planner")]
#[command(version)]
struct Cli {
    /// Inventory state file (created on first write)
    #[arg(short, long, global = true, default_value = "stowage-state.json")]
    state: PathBuf,

    /// Configuration overrides (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Current date, defaults to today (UTC)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan placements for a batch of items
    Place {
        /// Placement request (JSON, `-` for stdin)
        request: PathBuf,

        /// Commit the planned placements to the state file
        #[arg(long)]
        commit: bool,
    },

    /// Find an item and print retrieval instructions
    Search {
        /// Item ID
        #[arg(short, long, conflicts_with = "name")]
        id: Option<String>,

        /// Case-insensitive name fragment
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Retrieve an item, consuming one use
    Retrieve {
        /// Item ID
        id: String,

        /// Who is retrieving it
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Place an item at an explicit position
    ManualPlace {
        /// Place request (JSON, `-` for stdin)
        request: PathBuf,
    },

    /// Plan (or execute) a rearrangement of one container
    Rearrange {
        /// Container to make room in
        container: String,

        /// Item to make room for; defaults to the most urgent unplaced item
        #[arg(short, long)]
        item: Option<String>,

        /// Apply the plan to the state file
        #[arg(long)]
        execute: bool,
    },

    /// Simulate days of expiry and usage
    Simulate {
        /// Simulation request (JSON, `-` for stdin)
        request: PathBuf,
    },

    /// List expired and depleted items
    Waste,

    /// Plan which waste goes into the undocking container
    ReturnPlan {
        /// Return plan request (JSON, `-` for stdin)
        request: PathBuf,
    },

    /// Remove undocked items from the inventory
    Undock {
        /// IDs of the undocked items
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print the normalized inventory state
    Snapshot,
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let store = StateStore::new(&cli.state);
    let config = load_config(cli.config.as_deref())?;
    let mut inventory = store
        .load()
        .with_context(|| format!("Failed to load state from {}", store.path().display()))?;
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());

    match cli.command {
        Commands::Place { request, commit } => {
            let request: PlacementRequest = read_request(&request)?;
            if commit {
                print(&api::commit_placement(&request, &mut inventory, &config)?)?;
                store.save(&inventory)?;
            } else {
                print(&api::plan_placement(&request, &inventory, &config)?)?;
            }
        }

        Commands::Search { id, name } => {
            let request = RetrievalRequest {
                item_id: id,
                item_name: name,
            };
            print(&api::search(&request, &inventory)?)?;
        }

        Commands::Retrieve { id, user } => {
            let request = RetrieveRequest {
                item_id: id,
                user_id: user,
            };
            print(&api::retrieve(&request, &mut inventory)?)?;
            store.save(&inventory)?;
        }

        Commands::ManualPlace { request } => {
            let request: PlaceRequest = read_request(&request)?;
            let response = api::place(&request, &mut inventory)?;
            print(&response)?;
            if response.success {
                store.save(&inventory)?;
            }
        }

        Commands::Rearrange {
            container,
            item,
            execute,
        } => {
            let request = RearrangementRequest {
                container_id: container,
                item_id: item,
                item: None,
            };
            if execute {
                print(&api::execute_rearrangement(&request, &mut inventory, &config)?)?;
                store.save(&inventory)?;
            } else {
                print(&api::plan_rearrangement(&request, &inventory, &config)?)?;
            }
        }

        Commands::Simulate { request } => {
            let request: SimulationRequest = read_request(&request)?;
            print(&api::simulate(&request, &mut inventory, today)?)?;
            store.save(&inventory)?;
        }

        Commands::Waste => {
            print(&api::identify_waste(&inventory, today, Utc::now()))?;
        }

        Commands::ReturnPlan { request } => {
            let request: ReturnPlanRequest = read_request(&request)?;
            print(&api::return_plan(&request, &inventory, today, Utc::now())?)?;
        }

        Commands::Undock { items } => {
            let request = UndockingRequest { item_ids: items };
            print(&api::complete_undocking(&request, &mut inventory))?;
            store.save(&inventory)?;
        }

        Commands::Snapshot => {
            print(&InventorySnapshot::from_inventory(&inventory)?)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        if let Some(engine_err) = err.downcast_ref::<stowage::Error>() {
            print(&ErrorResponse::from(engine_err))?;
        }
        return Err(err);
    }
    Ok(())
}
