//! Geometry kernel: cuboids, axis-aligned orientations and overlap tests.
//!
//! Coordinates follow the container frame: `x` is width, `y` is depth and
//! `z` is height. Every container has a single open face on the `depth = 0`
//! plane; items are inserted and removed along the depth axis.

use nalgebra::Vector3;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Numeric tolerance for all geometric comparisons.
pub const EPSILON: f64 = 1e-9;

/// Index of the width axis.
pub const WIDTH_AXIS: usize = 0;

/// Index of the depth axis. This is the access axis: it is perpendicular to
/// the open face at `depth = 0`.
pub const ACCESS_AXIS: usize = 1;

/// Index of the height axis.
pub const HEIGHT_AXIS: usize = 2;

/// The face of a container through which items are inserted and removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OpenFace {
    /// The `depth = 0` plane. The only face the engine supports.
    #[default]
    DepthZero,
}

impl OpenFace {
    /// Axis perpendicular to this face.
    pub fn axis(&self) -> usize {
        match self {
            OpenFace::DepthZero => ACCESS_AXIS,
        }
    }

    /// Distance of a cuboid's near side from this face.
    pub fn distance(&self, cuboid: &Cuboid) -> f64 {
        cuboid.min[self.axis()]
    }
}

/// Checks that every dimension is strictly positive and finite.
pub fn validate_dimensions(label: &str, dims: &Vector3<f64>) -> Result<()> {
    if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
        return Err(Error::InvalidGeometry(format!(
            "All dimensions for '{}' must be positive, got {} x {} x {}",
            label, dims.x, dims.y, dims.z
        )));
    }
    Ok(())
}

/// An axis permutation applied to an item's intrinsic dimensions.
///
/// `axes[i]` names the intrinsic axis that ends up on container axis `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orientation {
    axes: [usize; 3],
}

impl Orientation {
    /// All six axis-aligned orientations, in search order.
    pub const ALL: [Orientation; 6] = [
        Orientation { axes: [0, 1, 2] }, // Identity
        Orientation { axes: [0, 2, 1] }, // Rotated 90° around X
        Orientation { axes: [1, 0, 2] }, // Rotated 90° around Z
        Orientation { axes: [1, 2, 0] }, // Rotated 90° around X then Z
        Orientation { axes: [2, 0, 1] }, // Rotated 90° around Y
        Orientation { axes: [2, 1, 0] }, // Rotated 90° around Y then X
    ];

    /// The orientation that keeps the intrinsic dimensions as they are.
    pub const IDENTITY: Orientation = Orientation::ALL[0];

    /// Returns the axis permutation.
    pub fn axes(&self) -> [usize; 3] {
        self.axes
    }

    /// Position of this orientation in [`Orientation::ALL`].
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|o| o == self)
            .unwrap_or_default()
    }

    /// Returns true for the identity permutation.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Applies the permutation to intrinsic dimensions.
    pub fn apply(&self, dims: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(dims[self.axes[0]], dims[self.axes[1]], dims[self.axes[2]])
    }

    /// Finds the first orientation mapping `intrinsic` onto `oriented`.
    pub fn matching(intrinsic: &Vector3<f64>, oriented: &Vector3<f64>) -> Option<Orientation> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| approx_eq_vec(&o.apply(intrinsic), oriented))
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Enumerates the distinct orientations of a box.
///
/// Orientations producing the same oriented dimensions (because two or three
/// axes share a length) are dropped, keeping the first in [`Orientation::ALL`]
/// order. A cube yields one orientation, a square prism three.
pub fn orientations(dims: &Vector3<f64>) -> Result<Vec<Orientation>> {
    validate_dimensions("item", dims)?;

    let mut distinct: Vec<(Orientation, Vector3<f64>)> = Vec::with_capacity(6);
    for orientation in Orientation::ALL {
        let oriented = orientation.apply(dims);
        if !distinct.iter().any(|(_, d)| approx_eq_vec(d, &oriented)) {
            distinct.push((orientation, oriented));
        }
    }

    Ok(distinct.into_iter().map(|(o, _)| o).collect())
}

fn approx_eq_vec(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    (a - b).iter().all(|d| d.abs() <= EPSILON)
}

/// An axis-aligned cuboid in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cuboid {
    /// Minimum corner (start coordinates).
    pub min: Vector3<f64>,
    /// Maximum corner (end coordinates).
    pub max: Vector3<f64>,
}

impl Cuboid {
    /// Creates a cuboid from its two corners.
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Creates a cuboid starting at `origin` with the given oriented size.
    pub fn at(origin: Vector3<f64>, size: Vector3<f64>) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Returns the size on each axis.
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Open-interval overlap on a single axis; shared faces do not overlap.
    pub fn overlaps_on(&self, other: &Cuboid, axis: usize) -> bool {
        self.min[axis] < other.max[axis] - EPSILON && other.min[axis] < self.max[axis] - EPSILON
    }

    /// Checks if this cuboid overlaps another on all three axes.
    pub fn intersects(&self, other: &Cuboid) -> bool {
        (0..3).all(|axis| self.overlaps_on(other, axis))
    }

    /// Checks if this cuboid lies within `[0, bounds]` on every axis.
    pub fn within(&self, bounds: &Vector3<f64>) -> bool {
        (0..3).all(|axis| self.min[axis] >= -EPSILON && self.max[axis] <= bounds[axis] + EPSILON)
    }
}

/// Checks if a cuboid fits inside a container of the given interior size.
pub fn fits(cuboid: &Cuboid, container_dims: &Vector3<f64>) -> bool {
    cuboid.within(container_dims)
}

/// Checks if two cuboids overlap. Touching faces do not count.
pub fn intersects(a: &Cuboid, b: &Cuboid) -> bool {
    a.intersects(b)
}

/// Returns the volume of a cuboid.
pub fn volume(cuboid: &Cuboid) -> f64 {
    cuboid.volume()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn test_orientations_distinct_box() {
        let all = orientations(&v(10.0, 20.0, 30.0)).unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], Orientation::IDENTITY);
    }

    #[test]
    fn test_orientations_dedup() {
        assert_eq!(orientations(&v(10.0, 10.0, 10.0)).unwrap().len(), 1);
        assert_eq!(orientations(&v(10.0, 10.0, 30.0)).unwrap().len(), 3);
    }

    #[test]
    fn test_orientations_reject_bad_dims() {
        assert!(matches!(
            orientations(&v(0.0, 10.0, 10.0)),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(orientations(&v(-1.0, 10.0, 10.0)).is_err());
        assert!(orientations(&v(f64::NAN, 10.0, 10.0)).is_err());
    }

    #[test]
    fn test_apply_and_matching() {
        let dims = v(10.0, 20.0, 30.0);
        let rotated = Orientation::ALL[4].apply(&dims);
        assert_eq!(rotated, v(30.0, 10.0, 20.0));
        assert_eq!(Orientation::matching(&dims, &rotated), Some(Orientation::ALL[4]));
        assert_eq!(Orientation::matching(&dims, &v(1.0, 2.0, 3.0)), None);
        assert_eq!(Orientation::ALL[4].index(), 4);
    }

    #[test]
    fn test_touching_faces_do_not_intersect() {
        let a = Cuboid::at(v(0.0, 0.0, 0.0), v(10.0, 10.0, 10.0));
        let b = Cuboid::at(v(10.0, 0.0, 0.0), v(10.0, 10.0, 10.0));
        let c = Cuboid::at(v(5.0, 5.0, 5.0), v(10.0, 10.0, 10.0));

        assert!(!intersects(&a, &b));
        assert!(intersects(&a, &c));
        assert!(intersects(&b, &c));
    }

    #[test]
    fn test_fits_and_volume() {
        let bounds = v(100.0, 100.0, 100.0);
        let inside = Cuboid::at(v(50.0, 0.0, 0.0), v(50.0, 50.0, 50.0));
        let outside = Cuboid::at(v(60.0, 0.0, 0.0), v(50.0, 50.0, 50.0));

        assert!(fits(&inside, &bounds));
        assert!(!fits(&outside, &bounds));
        assert_relative_eq!(volume(&inside), 125_000.0, epsilon = 0.001);
    }

    #[test]
    fn test_open_face_distance() {
        let c = Cuboid::at(v(3.0, 7.0, 1.0), v(1.0, 1.0, 1.0));
        assert_eq!(OpenFace::default().axis(), ACCESS_AXIS);
        assert_relative_eq!(OpenFace::DepthZero.distance(&c), 7.0);
    }
}
