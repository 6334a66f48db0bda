//! Replaceable placement strategies.
//!
//! The planners only ask a strategy for a position inside one container.
//! Alternative packers can be plugged in without touching the geometry
//! kernel or the container model.

use nalgebra::Vector3;
use stowage_core::{Config, Cuboid, Orientation, Strategy};

use crate::container::ContainerModel;
use crate::corner_point::{AnchorSelection, CornerPointStrategy};

/// A position found for an item inside a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Orientation applied to the item.
    pub orientation: Orientation,
    /// Occupied cuboid.
    pub cuboid: Cuboid,
}

impl Candidate {
    /// Creates a candidate for an item with the given intrinsic dimensions.
    pub fn new(orientation: Orientation, anchor: Vector3<f64>, intrinsic: &Vector3<f64>) -> Self {
        Self {
            orientation,
            cuboid: Cuboid::at(anchor, orientation.apply(intrinsic)),
        }
    }

    /// Start coordinates.
    pub fn start(&self) -> Vector3<f64> {
        self.cuboid.min
    }
}

/// Capability to position an item inside a single container.
pub trait PlacementStrategy: Send + Sync {
    /// Strategy name reported in results.
    fn name(&self) -> &str;

    /// Finds a position for an item with intrinsic `dims`, trying only the
    /// given orientations. Returns `None` if the item cannot be placed.
    fn find_position(
        &self,
        model: &ContainerModel,
        dims: &Vector3<f64>,
        orientations: &[Orientation],
    ) -> Option<Candidate>;
}

/// Builds the strategy selected by the configuration.
pub fn strategy_for(config: &Config) -> Box<dyn PlacementStrategy> {
    let selection = match config.strategy {
        Strategy::CornerPoint => AnchorSelection::OpenFaceFirst,
        Strategy::FirstFit => AnchorSelection::FirstFit,
    };
    Box::new(CornerPointStrategy::new(selection, config.max_anchor_points))
}
