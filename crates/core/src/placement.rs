//! Placement records for positioned items.

use nalgebra::Vector3;

use crate::geometry::{Cuboid, Orientation};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An item positioned inside a container, either proposed or committed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// The ID of the placed item.
    pub item_id: String,

    /// The container holding the item.
    pub container_id: String,

    /// Orientation applied to the item's intrinsic dimensions.
    pub orientation: Orientation,

    /// Start coordinates (minimum corner).
    pub start: Vector3<f64>,

    /// End coordinates (start + oriented dimensions).
    pub end: Vector3<f64>,
}

impl Placement {
    /// Creates a placement from a start corner and the item's intrinsic dimensions.
    pub fn new(
        item_id: impl Into<String>,
        container_id: impl Into<String>,
        orientation: Orientation,
        start: Vector3<f64>,
        intrinsic: &Vector3<f64>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            container_id: container_id.into(),
            orientation,
            start,
            end: start + orientation.apply(intrinsic),
        }
    }

    /// Returns the occupied cuboid.
    pub fn cuboid(&self) -> Cuboid {
        Cuboid::new(self.start, self.end)
    }

    /// Returns the oriented dimensions.
    pub fn size(&self) -> Vector3<f64> {
        self.end - self.start
    }

    /// Returns the occupied volume.
    pub fn volume(&self) -> f64 {
        self.cuboid().volume()
    }

    /// Returns a copy moved to another container and position.
    pub fn relocated(
        &self,
        container_id: impl Into<String>,
        orientation: Orientation,
        start: Vector3<f64>,
        intrinsic: &Vector3<f64>,
    ) -> Self {
        Self::new(self.item_id.clone(), container_id, orientation, start, intrinsic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_end_follows_orientation() {
        let dims = Vector3::new(10.0, 20.0, 30.0);
        let p = Placement::new("I1", "C1", Orientation::ALL[2], Vector3::new(1.0, 2.0, 3.0), &dims);

        assert_eq!(p.end, Vector3::new(21.0, 12.0, 33.0));
        assert_relative_eq!(p.volume(), 6000.0, epsilon = 0.001);
        assert_eq!(p.size(), Vector3::new(20.0, 10.0, 30.0));
    }

    #[test]
    fn test_relocated_keeps_item() {
        let dims = Vector3::new(10.0, 20.0, 30.0);
        let p = Placement::new("I1", "C1", Orientation::IDENTITY, Vector3::zeros(), &dims);
        let moved = p.relocated("C2", Orientation::ALL[5], Vector3::new(0.0, 5.0, 0.0), &dims);

        assert_eq!(moved.item_id, "I1");
        assert_eq!(moved.container_id, "C2");
        assert_eq!(moved.end, Vector3::new(30.0, 25.0, 10.0));
    }
}
