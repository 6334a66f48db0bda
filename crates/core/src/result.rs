//! Placement result representation.

use std::collections::HashMap;

use crate::placement::Placement;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why an item ended up in the residual list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnplacedReason {
    /// The item does not fit any container even when empty, in any orientation.
    Overcapacity,
    /// Some container could hold the item, but not with its current contents.
    InsufficientSpace,
}

impl UnplacedReason {
    /// Message reported to callers for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            UnplacedReason::Overcapacity => "Item exceeds every container in all orientations",
            UnplacedReason::InsufficientSpace => "Insufficient space - rearrangement required",
        }
    }
}

/// An item the planner could not place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unplaced {
    /// The ID of the item.
    pub item_id: String,
    /// Why it was not placed.
    pub reason: UnplacedReason,
}

impl Unplaced {
    /// Creates a residual entry.
    pub fn new(item_id: impl Into<String>, reason: UnplacedReason) -> Self {
        Self {
            item_id: item_id.into(),
            reason,
        }
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &'static str {
        self.reason.message()
    }
}

/// Result of a placement planning call.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementResult {
    /// Proposed placements, in the order they were decided.
    pub placements: Vec<Placement>,

    /// Items that could not be placed.
    pub unplaced: Vec<Unplaced>,

    /// Number of distinct containers receiving at least one new item.
    pub containers_used: usize,

    /// Volume of the newly placed items.
    pub placed_volume: f64,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Strategy used for planning.
    pub strategy: Option<String>,
}

impl PlacementResult {
    /// Creates a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if all items were placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Returns the number of placed items.
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Returns the number of unplaced items.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    /// Sets the strategy name.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Returns the placement proposed for an item.
    pub fn placement_of(&self, item_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.item_id == item_id)
    }

    /// Number of new placements per container.
    pub fn per_container(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for p in &self.placements {
            *counts.entry(p.container_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Records a placement.
    pub fn push(&mut self, placement: Placement) {
        self.placed_volume += placement.volume();
        self.placements.push(placement);
        self.containers_used = self.per_container().len();
    }
}
