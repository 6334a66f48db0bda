//! # Stowage
//!
//! Cargo placement, retrieval and rearrangement for containers that are
//! loaded through a single open face.
//!
//! This crate provides:
//! - **Placement**: best-effort batch placement honouring priority and preferred zones
//! - **Retrieval**: blocking items and step-by-step instructions
//! - **Rearrangement**: relocating low-priority items to make room
//! - **Lifecycle**: expiry and usage simulation, waste and undocking
//!
//! ## Quick Start
//!
//! ```rust
//! use stowage::core::{Container, Inventory, Item};
//! use stowage::engine::PlacementPlanner;
//!
//! let inventory = Inventory::new()
//!     .with_container(Container::new("contA", "Crew Quarters", 100.0, 85.0, 200.0));
//! let items = vec![Item::new("001", "Food Packet", 10.0, 10.0, 20.0).with_priority(80)];
//!
//! let result = PlacementPlanner::default_config()
//!     .plan_inventory(&items, &inventory)
//!     .unwrap();
//! assert!(result.all_placed());
//! ```
//!
//! ## Feature Flags
//!
//! - `engine` (default): planners, simulator and JSON API

/// Core records, geometry kernel and errors.
pub use stowage_core as core;

/// Planners, simulator and JSON API.
#[cfg(feature = "engine")]
pub use stowage_engine as engine;

// Re-export commonly used types at root level
pub use stowage_core::{Config, Container, Error, Inventory, Item, Placement, PlacementResult, Result, Strategy};
