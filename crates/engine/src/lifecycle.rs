//! Day-by-day simulation of item expiry and usage.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use stowage_core::{Inventory, Item};

/// Uses of one item requested every simulated day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRequest {
    /// Item to use.
    pub item_id: String,
    /// Uses per day.
    pub uses: u32,
}

impl UsageRequest {
    /// Creates a request for a single use per day.
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            uses: 1,
        }
    }

    /// Sets the number of uses per day.
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = uses;
        self
    }
}

/// Effect of consuming uses of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    /// The item has unlimited uses; nothing changed.
    Unlimited,
    /// The item was already depleted; nothing changed.
    AlreadyDepleted,
    /// Uses were consumed.
    Used {
        /// Uses left afterwards.
        remaining: u32,
        /// True if this call brought the item to zero.
        depleted_now: bool,
    },
}

/// Consumes `uses` from an item's usage limit, clamping at zero.
pub fn consume_use(item: &mut Item, uses: u32) -> UseOutcome {
    match item.usage_limit {
        None => UseOutcome::Unlimited,
        Some(0) => UseOutcome::AlreadyDepleted,
        Some(left) => {
            let remaining = left.saturating_sub(uses);
            item.usage_limit = Some(remaining);
            UseOutcome::Used {
                remaining,
                depleted_now: remaining == 0,
            }
        }
    }
}

/// Number of items that expired on one simulated day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredOnDay {
    /// 1-based day number.
    pub day: u32,
    /// Calendar date of that day.
    pub date: NaiveDate,
    /// Items that expired.
    pub count: usize,
}

/// One recorded use of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUse {
    /// Simulated day.
    pub day: u32,
    /// Item used.
    pub item_id: String,
    /// Its name.
    pub name: String,
    /// Uses left after that day.
    pub remaining_uses: u32,
}

/// An item that ran out of uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepletedItem {
    /// Day the last use was consumed.
    pub day: u32,
    /// Depleted item.
    pub item_id: String,
    /// Its name.
    pub name: String,
}

/// Changes produced by a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Number of days simulated.
    pub days_simulated: u32,
    /// Date of the last simulated day.
    pub end_date: NaiveDate,
    /// Expirations per day, only for days with at least one.
    pub items_expired: Vec<ExpiredOnDay>,
    /// Items that reached zero uses, one entry each.
    pub items_depleted_today: Vec<DepletedItem>,
    /// Every use applied.
    pub items_used: Vec<ItemUse>,
}

/// Expiry and usage simulator.
///
/// Day `d` is `start_date + d` days. An item is counted as expired on the
/// first day whose date is on or after its expiry, so items that expired
/// before the start date are counted on day 1. Expiry is checked before
/// usage, so an item that expires on a day is not used that day.
#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    start_date: NaiveDate,
}

impl Simulator {
    /// Creates a simulator starting from `start_date`.
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    /// Returns the start date.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Date of simulated day `day`.
    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(day)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Runs the simulation over `items`, updating their usage limits.
    pub fn run(&self, days: u32, usage: &[UsageRequest], items: &mut [Item]) -> SimulationReport {
        let mut expired: HashSet<String> = HashSet::new();

        let mut report = SimulationReport {
            days_simulated: days,
            end_date: self.date_of(days),
            items_expired: Vec::new(),
            items_depleted_today: Vec::new(),
            items_used: Vec::new(),
        };

        for day in 1..=days {
            let date = self.date_of(day);

            let newly: Vec<String> = items
                .iter()
                .filter(|i| i.is_expired_on(date) && !expired.contains(&i.id))
                .map(|i| i.id.clone())
                .collect();
            if !newly.is_empty() {
                report.items_expired.push(ExpiredOnDay {
                    day,
                    date,
                    count: newly.len(),
                });
                expired.extend(newly);
            }

            for request in usage {
                let Some(item) = items.iter_mut().find(|i| i.id == request.item_id) else {
                    log::warn!("Day {}: unknown item '{}' skipped", day, request.item_id);
                    continue;
                };
                if expired.contains(&item.id) {
                    continue;
                }

                if let UseOutcome::Used {
                    remaining,
                    depleted_now,
                } = consume_use(item, request.uses)
                {
                    report.items_used.push(ItemUse {
                        day,
                        item_id: item.id.clone(),
                        name: item.name.clone(),
                        remaining_uses: remaining,
                    });
                    if depleted_now {
                        report.items_depleted_today.push(DepletedItem {
                            day,
                            item_id: item.id.clone(),
                            name: item.name.clone(),
                        });
                    }
                }
            }
        }

        log::debug!(
            "Simulated {} days: {} uses, {} depleted, {} expiry days",
            days,
            report.items_used.len(),
            report.items_depleted_today.len(),
            report.items_expired.len()
        );
        report
    }

    /// Runs the simulation over the items of an inventory.
    pub fn run_inventory(
        &self,
        days: u32,
        usage: &[UsageRequest],
        inventory: &mut Inventory,
    ) -> SimulationReport {
        self.run(days, usage, &mut inventory.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_consume_use_clamps() {
        let mut item = Item::new("a", "Wipes", 1.0, 1.0, 1.0).with_usage_limit(2);
        assert_eq!(
            consume_use(&mut item, 5),
            UseOutcome::Used {
                remaining: 0,
                depleted_now: true
            }
        );
        assert_eq!(consume_use(&mut item, 1), UseOutcome::AlreadyDepleted);

        let mut unlimited = Item::new("b", "Wrench", 1.0, 1.0, 1.0);
        assert_eq!(consume_use(&mut unlimited, 1), UseOutcome::Unlimited);
    }

    #[test]
    fn test_depletes_once_over_three_days() {
        let mut items = vec![Item::new("food", "Ration", 1.0, 1.0, 1.0).with_usage_limit(2)];
        let sim = Simulator::new(date(2025, 1, 1));

        let report = sim.run(3, &[UsageRequest::new("food")], &mut items);

        let remaining: Vec<(u32, u32)> = report
            .items_used
            .iter()
            .map(|u| (u.day, u.remaining_uses))
            .collect();
        assert_eq!(remaining, vec![(1, 1), (2, 0)]);
        assert_eq!(report.items_depleted_today.len(), 1);
        assert_eq!(report.items_depleted_today[0].day, 2);
        assert_eq!(report.end_date, date(2025, 1, 4));
        assert_eq!(items[0].usage_limit, Some(0));
    }

    #[test]
    fn test_expiry_counted_once_and_blocks_use() {
        let mut items = vec![
            Item::new("milk", "Milk", 1.0, 1.0, 1.0)
                .with_expiry(date(2025, 1, 2))
                .with_usage_limit(10),
            Item::new("old", "Old Bread", 1.0, 1.0, 1.0).with_expiry(date(2024, 12, 1)),
            Item::new("tea", "Tea", 1.0, 1.0, 1.0).with_expiry(date(2025, 1, 3)),
        ];
        let sim = Simulator::new(date(2025, 1, 1));

        let report = sim.run(5, &[UsageRequest::new("milk")], &mut items);

        let per_day: Vec<(u32, usize)> = report.items_expired.iter().map(|e| (e.day, e.count)).collect();
        assert_eq!(per_day, vec![(1, 2), (2, 1)]);
        assert!(report.items_used.is_empty());
        assert_eq!(items[0].usage_limit, Some(10));
    }

    #[test]
    fn test_stale_expiry_counted_on_first_day_only() {
        let mut items = vec![
            Item::new("old", "Old Bread", 1.0, 1.0, 1.0)
                .with_expiry(date(2024, 12, 1))
                .with_usage_limit(5),
        ];
        let sim = Simulator::new(date(2025, 1, 1));

        let report = sim.run(3, &[UsageRequest::new("old")], &mut items);

        assert_eq!(
            report.items_expired,
            vec![ExpiredOnDay {
                day: 1,
                date: date(2025, 1, 2),
                count: 1
            }]
        );
        assert!(report.items_used.is_empty());
        assert_eq!(items[0].usage_limit, Some(5));
    }

    #[test]
    fn test_unknown_and_unlimited_items_are_not_reported() {
        let mut items = vec![Item::new("wrench", "Wrench", 1.0, 1.0, 1.0)];
        let sim = Simulator::new(date(2025, 1, 1));

        let report = sim.run(
            2,
            &[UsageRequest::new("wrench"), UsageRequest::new("ghost").with_uses(3)],
            &mut items,
        );

        assert_eq!(report.days_simulated, 2);
        assert!(report.items_used.is_empty());
        assert!(report.items_depleted_today.is_empty());
    }
}
