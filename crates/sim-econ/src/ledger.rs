//! Weighted-average inventory ledger.
//!
//! Production blends new units into the average cost; sales realize cost of
//! goods at the current average and leave it untouched.

use rust_decimal::Decimal;
use sim_core::{InputError, InventoryState};
use tracing::debug;

/// Units on hand and their weighted-average cost basis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryLedger {
    units_on_hand: u64,
    avg_cost: Decimal,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger holding `units` already booked at `unit_cost`.
    pub fn with_opening_stock(units: u64, unit_cost: Decimal) -> Result<Self, InputError> {
        let mut ledger = Self::new();
        ledger.produce(units, unit_cost)?;
        Ok(ledger)
    }

    pub fn units_on_hand(&self) -> u64 {
        self.units_on_hand
    }

    pub fn avg_cost(&self) -> Decimal {
        self.avg_cost
    }

    /// Total cost basis, `units_on_hand * avg_cost`.
    pub fn cost_basis(&self) -> Decimal {
        self.snapshot().value()
    }

    pub fn snapshot(&self) -> InventoryState {
        InventoryState {
            units_on_hand: self.units_on_hand,
            avg_cost: self.avg_cost,
        }
    }

    /// Book `quantity` new units at `unit_cost`.
    ///
    /// The average is recomputed from the full formula on every call:
    /// `(old_units * old_avg + quantity * unit_cost) / (old_units + quantity)`.
    /// On overflow the ledger is left untouched.
    pub fn produce(&mut self, quantity: u64, unit_cost: Decimal) -> Result<(), InputError> {
        if quantity == 0 {
            return Ok(());
        }
        let total_units = self
            .units_on_hand
            .checked_add(quantity)
            .ok_or(InputError::OutOfRange("units on hand"))?;
        let basis = Decimal::from(self.units_on_hand)
            .checked_mul(self.avg_cost)
            .and_then(|old| {
                Decimal::from(quantity)
                    .checked_mul(unit_cost)
                    .and_then(|new| old.checked_add(new))
            })
            .ok_or(InputError::OutOfRange("inventory cost basis"))?;
        self.avg_cost = (basis / Decimal::from(total_units)).normalize();
        self.units_on_hand = total_units;
        debug!(quantity, %unit_cost, avg_cost = %self.avg_cost, units = total_units, "produced");
        Ok(())
    }

    /// Remove `quantity` units and return their cost of goods sold.
    ///
    /// The average cost is unchanged, except that an emptied ledger resets it
    /// to zero.
    pub fn sell(&mut self, quantity: u64) -> Result<Decimal, InputError> {
        if quantity > self.units_on_hand {
            return Err(InputError::InsufficientStock {
                requested: quantity,
                on_hand: self.units_on_hand,
            });
        }
        let cogs = Decimal::from(quantity)
            .checked_mul(self.avg_cost)
            .ok_or(InputError::OutOfRange("cost of goods sold"))?;
        self.units_on_hand -= quantity;
        if self.units_on_hand == 0 {
            self.avg_cost = Decimal::ZERO;
        }
        Ok(cogs)
    }
}
