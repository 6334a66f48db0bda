//! # Stowage Core
//!
//! Core types and the geometry kernel for the Stowage cargo planning engine.
//!
//! This crate provides the records shared by every planner: containers,
//! items, placements, the inventory snapshot, configuration and errors.
//!
//! ## Core Components
//!
//! - **Geometry kernel**: [`Cuboid`], [`Orientation`], [`orientations`], [`fits`], [`intersects`]
//! - **Model**: [`Container`], [`Item`], [`Inventory`]
//! - **Placements**: [`Placement`], [`PlacementResult`]
//! - **Configuration**: [`Config`], [`Strategy`]
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geometry;
pub mod model;
pub mod placement;
pub mod result;
pub mod solver;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{
    fits, intersects, orientations, volume, Cuboid, OpenFace, Orientation, ACCESS_AXIS, EPSILON,
};
pub use model::{Container, Inventory, Item};
pub use placement::Placement;
pub use result::{PlacementResult, Unplaced, UnplacedReason};
pub use solver::{Config, Strategy};
