//! Waste identification, return planning and undocking.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use stowage_core::{Error, Inventory, Item, Result, EPSILON};

use crate::container::ContainerModel;
use crate::retrieval::{RetrievalAnalyzer, RetrievalReport};

/// Why an item became waste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WasteReason {
    /// Expiry date reached.
    Expired,
    /// No uses left.
    Depleted,
}

impl WasteReason {
    /// Wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteReason::Expired => "expired",
            WasteReason::Depleted => "depleted",
        }
    }
}

impl fmt::Display for WasteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item marked as waste.
#[derive(Debug, Clone, PartialEq)]
pub struct WasteRecord {
    /// Waste item.
    pub item_id: String,
    /// Its name.
    pub name: String,
    /// Why it is waste.
    pub reason: WasteReason,
    /// Mass in kg.
    pub mass: f64,
    /// Volume.
    pub volume: f64,
    /// When it was marked as waste.
    pub marked_at: DateTime<Utc>,
}

impl WasteRecord {
    /// Creates a record for an item.
    pub fn new(item: &Item, reason: WasteReason, marked_at: DateTime<Utc>) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            reason,
            mass: item.mass,
            volume: item.volume(),
            marked_at,
        }
    }
}

/// Returns a record for every expired or depleted item. Expiry takes
/// precedence when both apply.
pub fn identify_waste(items: &[Item], today: NaiveDate, marked_at: DateTime<Utc>) -> Vec<WasteRecord> {
    items
        .iter()
        .filter_map(|item| {
            let reason = if item.is_expired_on(today) {
                WasteReason::Expired
            } else if item.is_depleted() {
                WasteReason::Depleted
            } else {
                return None;
            };
            Some(WasteRecord::new(item, reason, marked_at))
        })
        .collect()
}

/// Parameters of a return (undocking) plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRequest {
    /// Container the waste is loaded into.
    pub undocking_container_id: String,
    /// Date of undocking.
    pub undocking_date: NaiveDate,
    /// Weight cap for the returned waste.
    pub max_weight: f64,
}

/// Manifest of the waste selected for return.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnManifest {
    /// Container leaving with the waste.
    pub undocking_container_id: String,
    /// Undocking date.
    pub undocking_date: NaiveDate,
    /// Items selected, oldest-marked first.
    pub items: Vec<WasteRecord>,
    /// Their volume.
    pub total_volume: f64,
    /// Their mass.
    pub total_weight: f64,
}

/// A return plan: the manifest plus how to get each selected item out.
#[derive(Debug, Clone)]
pub struct ReturnPlan {
    /// What goes into the undocking container.
    pub manifest: ReturnManifest,
    /// Retrieval report for every selected item that is currently placed.
    pub retrievals: Vec<RetrievalReport>,
    /// True if every waste record was selected.
    pub complete: bool,
}

impl ReturnPlan {
    /// Number of items to return.
    pub fn items_to_return(&self) -> usize {
        self.manifest.items.len()
    }
}

/// Selects waste for return.
///
/// If all waste fits the undocking container's available volume and the
/// weight cap it is all returned; otherwise records are taken oldest-marked
/// first, skipping any that would exceed either cap.
pub fn plan_return(
    request: &ReturnRequest,
    waste: &[WasteRecord],
    inventory: &Inventory,
) -> Result<ReturnPlan> {
    if !request.max_weight.is_finite() || request.max_weight < 0.0 {
        return Err(Error::InvalidInput(format!(
            "Weight cap must be a non-negative number, got {}",
            request.max_weight
        )));
    }

    let model = ContainerModel::from_inventory(inventory, &request.undocking_container_id)?;
    let capacity = model.available_volume();

    let mut ordered: Vec<&WasteRecord> = waste.iter().collect();
    ordered.sort_by(|a, b| a.marked_at.cmp(&b.marked_at).then_with(|| a.item_id.cmp(&b.item_id)));

    let total_volume: f64 = waste.iter().map(|w| w.volume).sum();
    let total_weight: f64 = waste.iter().map(|w| w.mass).sum();
    let complete = total_volume <= capacity + EPSILON && total_weight <= request.max_weight + EPSILON;

    let selected: Vec<WasteRecord> = if complete {
        ordered.into_iter().cloned().collect()
    } else {
        let (mut volume, mut weight) = (0.0, 0.0);
        let mut taken = Vec::new();
        for record in ordered {
            if volume + record.volume <= capacity + EPSILON
                && weight + record.mass <= request.max_weight + EPSILON
            {
                volume += record.volume;
                weight += record.mass;
                taken.push(record.clone());
            }
        }
        log::debug!(
            "Return to '{}' limited to {} of {} waste items",
            request.undocking_container_id,
            taken.len(),
            waste.len()
        );
        taken
    };

    let analyzer = RetrievalAnalyzer::default();
    let mut retrievals = Vec::new();
    for record in &selected {
        if inventory.placement_of(&record.item_id).is_some() {
            retrievals.push(analyzer.analyze(&record.item_id, inventory)?);
        }
    }

    Ok(ReturnPlan {
        manifest: ReturnManifest {
            undocking_container_id: request.undocking_container_id.clone(),
            undocking_date: request.undocking_date,
            total_volume: selected.iter().map(|w| w.volume).sum(),
            total_weight: selected.iter().map(|w| w.mass).sum(),
            items: selected,
        },
        retrievals,
        complete,
    })
}

/// Removes returned items and their placements; returns how many were removed.
pub fn complete_undocking<S: AsRef<str>>(item_ids: &[S], inventory: &mut Inventory) -> usize {
    let removed = item_ids
        .iter()
        .filter(|id| inventory.remove_item(id.as_ref()).is_some())
        .count();
    log::debug!("Undocked {} waste items", removed);
    removed
}
