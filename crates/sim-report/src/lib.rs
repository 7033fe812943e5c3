#![deny(warnings)]

//! Read-only aggregates over a run's day records.
//!
//! Everything here is re-derived from the records on each call, so callers
//! can rebuild reports for any prefix of a run without re-simulating.

use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{DayRecord, RunSnapshot};

/// One reported day with running totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub day_index: u32,
    pub scenario: String,
    pub price: Decimal,
    pub production_cost: Decimal,
    pub units_produced: u64,
    pub units_sold: u64,
    pub lost_sales: u64,
    pub revenue: Decimal,
    pub production_spend: Decimal,
    pub cogs: Decimal,
    pub profit: Decimal,
    pub inventory_units: u64,
    /// Ending stock at average cost.
    pub inventory_value: Decimal,
    /// Ending stock at the day's selling price.
    pub inventory_at_price: Decimal,
    /// Ending stock at average cost per unit.
    pub avg_cost: Decimal,
    pub cumulative_revenue: Decimal,
    pub cumulative_spend: Decimal,
    pub cumulative_cogs: Decimal,
    pub cumulative_profit: Decimal,
    /// `cumulative_profit + inventory_value`.
    pub total_value: Decimal,
    pub cash_after: Decimal,
}

/// End-of-run figures.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub days: u32,
    pub starting_cash: Decimal,
    pub final_cash: Decimal,
    /// `final_cash - starting_cash`.
    pub cash_profit: Decimal,
    pub total_revenue: Decimal,
    pub total_spend: Decimal,
    pub total_cogs: Decimal,
    pub total_profit: Decimal,
    pub total_lost_sales: u64,
    pub inventory_units: u64,
    /// Stock at average cost.
    pub inventory_at_cost: Decimal,
    /// Stock at the last selling price.
    pub inventory_at_price: Decimal,
    /// `total_profit + inventory_at_cost`.
    pub total_value: Decimal,
    /// `cash_profit + inventory_at_price`.
    pub total_value_created: Decimal,
}

/// Full report: per-day rows and the summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub summary: RunSummary,
}

pub struct ReportBuilder;

fn at_price(record: &DayRecord) -> Decimal {
    Decimal::from(record.ending_inventory.units_on_hand).saturating_mul(record.price)
}

impl ReportBuilder {
    /// Per-day rows with cumulative totals, in record order.
    pub fn rows(records: &[DayRecord]) -> Vec<ReportRow> {
        let mut cum_revenue = Decimal::ZERO;
        let mut cum_spend = Decimal::ZERO;
        let mut cum_cogs = Decimal::ZERO;
        let mut cum_profit = Decimal::ZERO;
        records
            .iter()
            .map(|r| {
                cum_revenue = cum_revenue.saturating_add(r.revenue);
                cum_spend = cum_spend.saturating_add(r.production_spend);
                cum_cogs = cum_cogs.saturating_add(r.cogs);
                cum_profit = cum_profit.saturating_add(r.profit);
                let inventory_value = r.ending_inventory.value();
                ReportRow {
                    day_index: r.day_index,
                    scenario: r.scenario.clone(),
                    price: r.price,
                    production_cost: r.production_cost,
                    units_produced: r.units_produced,
                    units_sold: r.units_sold,
                    lost_sales: r.lost_sales,
                    revenue: r.revenue,
                    production_spend: r.production_spend,
                    cogs: r.cogs,
                    profit: r.profit,
                    inventory_units: r.ending_inventory.units_on_hand,
                    inventory_value,
                    inventory_at_price: at_price(r),
                    avg_cost: r.ending_inventory.avg_cost,
                    cumulative_revenue: cum_revenue,
                    cumulative_spend: cum_spend,
                    cumulative_cogs: cum_cogs,
                    cumulative_profit: cum_profit,
                    total_value: cum_profit.saturating_add(inventory_value),
                    cash_after: r.cash_after,
                }
            })
            .collect()
    }

    /// Summary over `records`. With no records the run is still at its
    /// opening position, which the records alone cannot show.
    pub fn summary(records: &[DayRecord], starting_cash: Decimal) -> RunSummary {
        let Some(last) = records.last() else {
            return RunSummary {
                starting_cash,
                final_cash: starting_cash,
                ..RunSummary::default()
            };
        };
        let sum = |f: fn(&DayRecord) -> Decimal| {
            records
                .iter()
                .map(f)
                .fold(Decimal::ZERO, Decimal::saturating_add)
        };
        let total_profit = sum(|r| r.profit);
        let inventory_at_cost = last.ending_inventory.value();
        let inventory_at_price = at_price(last);
        let cash_profit = last.cash_after.saturating_sub(starting_cash);
        RunSummary {
            days: last.day_index,
            starting_cash,
            final_cash: last.cash_after,
            cash_profit,
            total_revenue: sum(|r| r.revenue),
            total_spend: sum(|r| r.production_spend),
            total_cogs: sum(|r| r.cogs),
            total_profit,
            total_lost_sales: records
                .iter()
                .fold(0u64, |acc, r| acc.saturating_add(r.lost_sales)),
            inventory_units: last.ending_inventory.units_on_hand,
            inventory_at_cost,
            inventory_at_price,
            total_value: total_profit.saturating_add(inventory_at_cost),
            total_value_created: cash_profit.saturating_add(inventory_at_price),
        }
    }

    pub fn build(records: &[DayRecord], starting_cash: Decimal) -> Report {
        Report {
            rows: Self::rows(records),
            summary: Self::summary(records, starting_cash),
        }
    }

    pub fn from_snapshot(snapshot: &RunSnapshot) -> Report {
        let mut report = Self::build(&snapshot.records, snapshot.starting_cash);
        if snapshot.records.is_empty() {
            // opening stock only shows up in the snapshot
            report.summary.inventory_units = snapshot.inventory.units_on_hand;
            report.summary.inventory_at_cost = snapshot.inventory.value();
            report.summary.total_value = report.summary.inventory_at_cost;
        }
        report
    }
}
