//! Containers, items and the inventory snapshot handed to each planning call.

use chrono::NaiveDate;
use nalgebra::Vector3;

use crate::geometry::validate_dimensions;
use crate::placement::Placement;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest allowed item priority.
pub const MAX_PRIORITY: u8 = 100;

/// A storage container with a cuboid interior.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    /// Unique identifier.
    pub id: String,

    /// Zone tag (e.g. a station module).
    pub zone: String,

    /// Interior dimensions (width, depth, height).
    pub dimensions: Vector3<f64>,
}

impl Container {
    /// Creates a new container with the given interior dimensions.
    pub fn new(
        id: impl Into<String>,
        zone: impl Into<String>,
        width: f64,
        depth: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            zone: zone.into(),
            dimensions: Vector3::new(width, depth, height),
        }
    }

    /// Returns the interior volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    /// Validates the interior dimensions.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(&self.id, &self.dimensions)
    }
}

/// A cargo item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// Unique identifier.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Intrinsic (unoriented) dimensions.
    pub dimensions: Vector3<f64>,

    /// Priority from 0 to 100, higher is more urgent.
    pub priority: u8,

    /// Zone the item should preferably be stored in.
    pub preferred_zone: Option<String>,

    /// Date on which the item expires.
    pub expiry_date: Option<NaiveDate>,

    /// Remaining number of uses; `None` means unlimited.
    pub usage_limit: Option<u32>,

    /// Mass in kilograms.
    pub mass: f64,
}

impl Item {
    /// Creates a new item with default priority 50 and no limits.
    pub fn new(id: impl Into<String>, name: impl Into<String>, width: f64, depth: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dimensions: Vector3::new(width, depth, height),
            priority: 50,
            preferred_zone: None,
            expiry_date: None,
            usage_limit: None,
            mass: 0.0,
        }
    }

    /// Sets the priority, clamped to 100.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(MAX_PRIORITY);
        self
    }

    /// Sets the preferred zone.
    pub fn with_preferred_zone(mut self, zone: impl Into<String>) -> Self {
        self.preferred_zone = Some(zone.into());
        self
    }

    /// Sets the expiry date.
    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Sets the remaining number of uses.
    pub fn with_usage_limit(mut self, uses: u32) -> Self {
        self.usage_limit = Some(uses);
        self
    }

    /// Sets the mass.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Returns the volume.
    pub fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    /// Returns true if the item expires on or before `date`.
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= date)
    }

    /// Returns true if the item has a usage limit and no uses left.
    pub fn is_depleted(&self) -> bool {
        self.usage_limit == Some(0)
    }

    /// Returns true if the item is expired on `date` or depleted.
    pub fn is_waste_eligible(&self, date: NaiveDate) -> bool {
        self.is_expired_on(date) || self.is_depleted()
    }

    /// Returns true if the item prefers the given zone.
    pub fn prefers_zone(&self, zone: &str) -> bool {
        self.preferred_zone.as_deref() == Some(zone)
    }

    /// Validates dimensions, priority and mass.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(&self.id, &self.dimensions)?;

        if self.priority > MAX_PRIORITY {
            return Err(Error::InvalidInput(format!(
                "Priority for '{}' must be at most {}",
                self.id, MAX_PRIORITY
            )));
        }

        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Mass for '{}' cannot be negative",
                self.id
            )));
        }

        Ok(())
    }
}

/// The caller-owned records a planning call operates on.
///
/// The engine borrows an inventory for the duration of one call and never
/// keeps it afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inventory {
    /// All known containers.
    pub containers: Vec<Container>,
    /// All known items, placed or not.
    pub items: Vec<Item>,
    /// Committed placements (at most one per item).
    pub placements: Vec<Placement>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a container.
    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    /// Adds an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Adds a placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placements.push(placement);
        self
    }

    /// Looks up an item by id.
    pub fn item(&self, id: &str) -> Result<&Item> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Looks up an item by id for mutation.
    pub fn item_mut(&mut self, id: &str) -> Result<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Looks up a container by id.
    pub fn container(&self, id: &str) -> Result<&Container> {
        self.containers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))
    }

    /// Returns the placement of an item, if it is placed.
    pub fn placement_of(&self, item_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.item_id == item_id)
    }

    /// Returns all placements in a container.
    pub fn placements_in<'a>(&'a self, container_id: &'a str) -> impl Iterator<Item = &'a Placement> + 'a {
        self.placements
            .iter()
            .filter(move |p| p.container_id == container_id)
    }

    /// Returns items that are not placed anywhere.
    pub fn unplaced_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items
            .iter()
            .filter(|i| self.placement_of(&i.id).is_none())
    }

    /// Removes an item and its placement. Returns the removed item.
    pub fn remove_item(&mut self, item_id: &str) -> Option<Item> {
        self.placements.retain(|p| p.item_id != item_id);
        let idx = self.items.iter().position(|i| i.id == item_id)?;
        Some(self.items.remove(idx))
    }

    /// Replaces (or inserts) the placement of an item.
    pub fn set_placement(&mut self, placement: Placement) {
        self.placements.retain(|p| p.item_id != placement.item_id);
        self.placements.push(placement);
    }
}
