//! Planner configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anchor selection strategy for the placement search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Corner-point search; among all fitting candidates in a container the
    /// one nearest the open face wins (default).
    #[default]
    CornerPoint,
    /// Corner-point search accepting the first fitting orientation and anchor.
    FirstFit,
}

impl Strategy {
    /// Name reported in results.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::CornerPoint => "CornerPoint",
            Strategy::FirstFit => "FirstFit",
        }
    }
}

/// Common configuration for the planners.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Anchor selection strategy.
    pub strategy: Strategy,

    /// Maximum anchor points examined per container and orientation.
    pub max_anchor_points: usize,

    /// Minimum number of candidate containers before the per-container
    /// search runs on the rayon pool (0 = never parallel).
    pub parallel_threshold: usize,

    /// Estimated minutes to move an item between containers.
    pub minutes_per_move: f64,

    /// Estimated minutes to rotate an item in place.
    pub minutes_per_rotation: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_anchor_points: 512,
            parallel_threshold: 8,
            minutes_per_move: 5.0,
            minutes_per_rotation: 2.0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the anchor selection strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the anchor cap per container (at least 1).
    pub fn with_max_anchor_points(mut self, n: usize) -> Self {
        self.max_anchor_points = n.max(1);
        self
    }

    /// Sets the container count from which the search runs in parallel.
    pub fn with_parallel_threshold(mut self, n: usize) -> Self {
        self.parallel_threshold = n;
        self
    }

    /// Sets the time estimates used by the rearrangement planner.
    pub fn with_step_minutes(mut self, per_move: f64, per_rotation: f64) -> Self {
        self.minutes_per_move = per_move.max(0.0);
        self.minutes_per_rotation = per_rotation.max(0.0);
        self
    }

    /// Returns true if a search over `containers` candidates should run in parallel.
    pub fn is_parallel(&self, containers: usize) -> bool {
        self.parallel_threshold > 0 && containers >= self.parallel_threshold
    }
}
