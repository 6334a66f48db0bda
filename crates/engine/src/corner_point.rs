//! Corner-point heuristic for placing boxes in a container.
//!
//! Candidate positions are the container origin and, for every item already
//! placed, the points reached by pushing its start corner to its end along a
//! single axis. This is a reduced form of the Extreme Point heuristic: it does
//! not project points onto neighbouring boxes, so packing is feasible and
//! dense enough but not exhaustive.
//!
//! # References
//!
//! - Crainic, T. G., Perboli, G., & Tadei, R. (2008). Extreme point-based heuristics
//!   for three-dimensional bin packing.

use std::cmp::Ordering;

use nalgebra::Vector3;
use stowage_core::Orientation;

use crate::container::ContainerModel;
use crate::strategy::{Candidate, PlacementStrategy};

/// How the winning candidate is chosen within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorSelection {
    /// Among all fitting (orientation, anchor) pairs, take the one nearest the
    /// open face, then lowest width, depth, height, then orientation order.
    #[default]
    OpenFaceFirst,
    /// Take the first fitting anchor of the first orientation that fits.
    FirstFit,
}

/// Corner-point placement strategy.
#[derive(Debug, Clone)]
pub struct CornerPointStrategy {
    selection: AnchorSelection,
    max_anchor_points: usize,
}

impl CornerPointStrategy {
    /// Creates a strategy examining at most `max_anchor_points` anchors.
    pub fn new(selection: AnchorSelection, max_anchor_points: usize) -> Self {
        Self {
            selection,
            max_anchor_points: max_anchor_points.max(1),
        }
    }

    /// Returns the selection rule.
    pub fn selection(&self) -> AnchorSelection {
        self.selection
    }

    fn anchors(&self, model: &ContainerModel) -> Vec<Vector3<f64>> {
        let mut anchors = model.anchor_points();
        if anchors.len() > self.max_anchor_points {
            log::debug!(
                "Container '{}' has {} anchors, examining the first {}",
                model.id(),
                anchors.len(),
                self.max_anchor_points
            );
            anchors.truncate(self.max_anchor_points);
        }
        anchors
    }

    /// First fitting anchor for one orientation. Anchors are already ordered
    /// nearest the open face first, so this is the best anchor for it.
    fn first_fit(
        model: &ContainerModel,
        anchors: &[Vector3<f64>],
        dims: &Vector3<f64>,
        orientation: Orientation,
    ) -> Option<Candidate> {
        anchors
            .iter()
            .map(|anchor| Candidate::new(orientation, *anchor, dims))
            .find(|candidate| model.would_fit(&candidate.cuboid))
    }
}

impl Default for CornerPointStrategy {
    fn default() -> Self {
        Self::new(AnchorSelection::default(), 512)
    }
}

impl PlacementStrategy for CornerPointStrategy {
    fn name(&self) -> &str {
        match self.selection {
            AnchorSelection::OpenFaceFirst => "CornerPoint",
            AnchorSelection::FirstFit => "FirstFit",
        }
    }

    fn find_position(
        &self,
        model: &ContainerModel,
        dims: &Vector3<f64>,
        orientations: &[Orientation],
    ) -> Option<Candidate> {
        let anchors = self.anchors(model);

        match self.selection {
            AnchorSelection::FirstFit => orientations
                .iter()
                .find_map(|o| Self::first_fit(model, &anchors, dims, *o)),
            AnchorSelection::OpenFaceFirst => orientations
                .iter()
                .filter_map(|o| Self::first_fit(model, &anchors, dims, *o))
                .min_by(compare_candidates),
        }
    }
}

/// Orders candidates by distance from the open face (depth), then width,
/// height and orientation index.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    let (sa, sb) = (a.start(), b.start());
    sa.y.total_cmp(&sb.y)
        .then(sa.x.total_cmp(&sb.x))
        .then(sa.z.total_cmp(&sb.z))
        .then(a.orientation.index().cmp(&b.orientation.index()))
}
