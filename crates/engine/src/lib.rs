//! # Stowage Engine
//!
//! Placement, retrieval, rearrangement and lifecycle planning for cargo
//! containers that are loaded and unloaded through a single open face.
//!
//! All operations are synchronous and work on a caller-owned
//! [`Inventory`](stowage_core::Inventory); results are pure outputs that the
//! caller may commit.
//!
//! ## Components
//!
//! - [`ContainerModel`]: occupancy of one container and its anchor points
//! - [`PlacementPlanner`]: batch placement over many containers
//! - [`RetrievalAnalyzer`]: blockers and instructions for reaching an item
//! - [`RearrangementPlanner`]: relocating low-priority items to make room
//! - [`Simulator`]: day-by-day expiry and usage
//! - [`waste`]: waste identification, return planning and undocking
//! - [`api`]: JSON request/response shapes

pub mod api;
pub mod container;
pub mod corner_point;
pub mod lifecycle;
pub mod planner;
pub mod rearrange;
pub mod retrieval;
pub mod strategy;
pub mod waste;

// Re-exports
pub use container::ContainerModel;
pub use corner_point::{AnchorSelection, CornerPointStrategy};
pub use lifecycle::{consume_use, SimulationReport, Simulator, UsageRequest};
pub use planner::PlacementPlanner;
pub use rearrange::{RearrangementOutcome, RearrangementPlan, RearrangementPlanner, RearrangementStep};
pub use retrieval::{RetrievalAnalyzer, RetrievalReport, RetrievalStep};
pub use strategy::{Candidate, PlacementStrategy};
pub use stowage_core::{Config, Error, Placement, PlacementResult, Result, Strategy};
pub use waste::{ReturnPlan, ReturnRequest, WasteReason, WasteRecord};
