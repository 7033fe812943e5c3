#![deny(warnings)]

//! Day-cycle runtime for the Toy Shop simulator.
//!
//! [`DayCycleEngine`] owns the only mutable aggregate, the [`SimulationRun`],
//! and advances it one day per [`DayCycleEngine::submit_day`] call through the
//! phases `Pending -> Produced -> Sold -> Reported`. Every check happens while
//! the day is still `Pending`; a rejected day leaves no trace.

use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    ConfigError, DayInput, DayRecord, InputError, InventoryState, RunSnapshot, ScenarioMultiplier,
    SimConfig, SimError,
};
use sim_econ::{CostSampler, DemandModel, InventoryLedger, ScenarioProvider};
use tracing::{debug, info, warn};

mod shared;

pub use shared::SharedRun;

/// Where the engine is within the current day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPhase {
    /// Waiting for operator input for `day_index`.
    Pending { day_index: u32 },
    /// Today's units are booked into the ledger.
    Produced { day_index: u32 },
    /// Sales are settled against the ledger.
    Sold { day_index: u32 },
    /// The day record is appended; terminal for the day.
    Reported { day_index: u32 },
}

impl DayPhase {
    pub fn day_index(&self) -> u32 {
        match *self {
            DayPhase::Pending { day_index }
            | DayPhase::Produced { day_index }
            | DayPhase::Sold { day_index }
            | DayPhase::Reported { day_index } => day_index,
        }
    }
}

/// Ordered day records plus current stock and cash.
#[derive(Clone, Debug)]
pub struct SimulationRun {
    records: Vec<DayRecord>,
    ledger: InventoryLedger,
    starting_cash: Decimal,
    cash: Decimal,
}

impl SimulationRun {
    fn open(cfg: &SimConfig) -> Self {
        Self {
            records: Vec::new(),
            // out-of-range opening stock is refused by `SimConfig::validate`
            ledger: InventoryLedger::with_opening_stock(
                cfg.starting_inventory,
                cfg.starting_unit_cost(),
            )
            .unwrap_or_default(),
            starting_cash: cfg.starting_cash,
            cash: cfg.starting_cash,
        }
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn inventory(&self) -> InventoryState {
        self.ledger.snapshot()
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }
}

/// What the pending day looks like before the operator commits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayPreview {
    pub day_index: u32,
    pub date: Option<NaiveDate>,
    pub scenario: ScenarioMultiplier,
    /// Unit production cost the day will be charged.
    pub production_cost: Decimal,
    /// Demand at the previewed price.
    pub expected_demand: u64,
    /// Stock carried into the day.
    pub inventory: InventoryState,
    pub cash: Decimal,
    /// Largest production the current cash pays for.
    pub max_affordable: u64,
}

/// Everything drawn and computed for a day before any mutation.
struct DayPlan {
    day_index: u32,
    scenario: ScenarioMultiplier,
    production_cost: Decimal,
    production_spend: Decimal,
    demand: u64,
    units_sold: u64,
    revenue: Decimal,
    cogs: Decimal,
    cash_after: Decimal,
    /// Ledger after today's production is booked.
    produced: InventoryLedger,
    /// Ledger after today's sales are settled.
    sold: InventoryLedger,
}

/// Orchestrates one simulated day at a time.
#[derive(Clone, Debug)]
pub struct DayCycleEngine {
    config: SimConfig,
    seed: u64,
    demand: DemandModel,
    costs: CostSampler,
    scenarios: ScenarioProvider,
    run: SimulationRun,
    phase: DayPhase,
}

impl DayCycleEngine {
    /// Build an engine without validating `config`; a bad configuration is
    /// reported by the first [`submit_day`](Self::submit_day).
    pub fn new(config: SimConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        let engine = Self {
            demand: DemandModel::from_config(&config),
            costs: CostSampler::new(seed).with_precision(config.cost_precision),
            scenarios: ScenarioProvider::from_config(&config, seed),
            run: SimulationRun::open(&config),
            phase: DayPhase::Pending { day_index: 1 },
            config,
            seed,
        };
        info!(seed, days = ?engine.config.days, "simulation run opened");
        engine
    }

    /// Validate `config` and build an engine.
    pub fn try_new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed driving cost and scenario draws, including one drawn from entropy.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> DayPhase {
        self.phase
    }

    /// Day the next submission simulates.
    pub fn day_index(&self) -> u32 {
        self.phase.day_index()
    }

    pub fn run(&self) -> &SimulationRun {
        &self.run
    }

    /// True once the configured number of days has been reported.
    pub fn is_finished(&self) -> bool {
        matches!(self.config.days, Some(days) if self.day_index() > days)
    }

    /// Simulate the pending day with `price` and `quantity`.
    pub fn submit_day(&mut self, price: Decimal, quantity: u64) -> Result<DayRecord, SimError> {
        self.submit(DayInput::new(price, quantity))
    }

    /// Simulate the pending day.
    pub fn submit(&mut self, input: DayInput) -> Result<DayRecord, SimError> {
        let plan = match self.plan(&input) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(day_index = self.day_index(), error = %e, "day rejected");
                return Err(e);
            }
        };
        Ok(self.settle(input, plan))
    }

    /// Read-only copy of the run so far.
    pub fn get_run_snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            seed: self.seed,
            next_day: self.day_index(),
            starting_cash: self.run.starting_cash,
            cash: self.run.cash,
            inventory: self.run.inventory(),
            records: self.run.records.clone(),
        }
    }

    /// Scenario, cost and demand the pending day would see at `price`.
    pub fn preview(&self, price: Decimal) -> Result<DayPreview, SimError> {
        let input = DayInput::new(price, 0);
        let plan = self.plan(&input)?;
        Ok(DayPreview {
            day_index: plan.day_index,
            date: self.date_of(plan.day_index),
            max_affordable: affordable_units(self.run.cash, plan.production_cost),
            scenario: plan.scenario,
            production_cost: plan.production_cost,
            expected_demand: plan.demand,
            inventory: self.run.inventory(),
            cash: self.run.cash,
        })
    }

    /// Pending phase: every check and draw, no mutation.
    fn plan(&self, input: &DayInput) -> Result<DayPlan, SimError> {
        input.validate()?;
        let day_index = self.day_index();
        if let Some(days) = self.config.days {
            if day_index > days {
                return Err(InputError::HorizonReached(days).into());
            }
        }
        if day_index == u32::MAX {
            return Err(InputError::OutOfRange("day index").into());
        }
        self.config.validate()?;
        if input.price < self.config.min_price {
            return Err(InputError::PriceBelowMinimum {
                price: input.price,
                min: self.config.min_price,
            }
            .into());
        }

        let scenario = self.scenarios.next(day_index);
        let production_cost =
            self.costs
                .sample_for_day(day_index, self.config.min_cost, self.config.max_cost)?;
        let production_spend = Decimal::from(input.quantity)
            .checked_mul(production_cost)
            .ok_or(InputError::OutOfRange("production spend"))?;
        if self.config.enforce_cash && production_spend > self.run.cash {
            return Err(InputError::InsufficientCash {
                required: production_spend,
                available: self.run.cash,
            }
            .into());
        }
        let demand = self.demand.expected_demand(input.price, &scenario);

        let mut produced = self.run.ledger.clone();
        produced.produce(input.quantity, production_cost)?;
        let units_sold = demand.min(produced.units_on_hand());
        let mut sold = produced.clone();
        let cogs = sold.sell(units_sold)?;
        let revenue = Decimal::from(units_sold)
            .checked_mul(input.price)
            .ok_or(InputError::OutOfRange("revenue"))?;
        let cash_after = self
            .run
            .cash
            .checked_sub(production_spend)
            .and_then(|c| c.checked_add(revenue))
            .ok_or(InputError::OutOfRange("cash balance"))?;

        debug!(day_index, scenario = %scenario.name, %production_cost, demand, "day planned");
        Ok(DayPlan {
            day_index,
            scenario,
            production_cost,
            production_spend,
            demand,
            units_sold,
            revenue,
            cogs,
            cash_after,
            produced,
            sold,
        })
    }

    /// Produced -> Sold -> Reported, then advance to the next Pending day.
    ///
    /// Applies a plan that already passed every check, so it cannot fail.
    fn settle(&mut self, input: DayInput, plan: DayPlan) -> DayRecord {
        let DayPlan {
            day_index,
            scenario,
            production_cost,
            production_spend,
            demand,
            units_sold,
            revenue,
            cogs,
            cash_after,
            produced,
            sold,
        } = plan;

        self.run.ledger = produced;
        self.phase = DayPhase::Produced { day_index };

        self.run.ledger = sold;
        self.phase = DayPhase::Sold { day_index };
        let lost_sales = demand - units_sold;
        if lost_sales > 0 {
            warn!(day_index, demand, units_sold, lost_sales, "stock-out");
        }

        self.run.cash = cash_after;
        let record = DayRecord {
            day_index,
            date: self.date_of(day_index),
            scenario: scenario.name,
            factor: scenario.factor,
            price: input.price,
            units_produced: input.quantity,
            production_cost,
            production_spend,
            demand,
            units_sold,
            lost_sales,
            revenue,
            cogs,
            profit: revenue - cogs,
            cash_after,
            ending_inventory: self.run.ledger.snapshot(),
        };
        self.run.records.push(record.clone());
        self.phase = DayPhase::Reported { day_index };
        info!(
            day_index,
            units_sold,
            revenue = %record.revenue,
            profit = %record.profit,
            on_hand = record.ending_inventory.units_on_hand,
            "day reported"
        );

        self.phase = DayPhase::Pending {
            day_index: day_index + 1,
        };
        record
    }

    fn date_of(&self, day_index: u32) -> Option<NaiveDate> {
        let start = self.config.start_date?;
        start.checked_add_days(Days::new(u64::from(day_index.saturating_sub(1))))
    }
}

fn affordable_units(cash: Decimal, unit_cost: Decimal) -> u64 {
    if unit_cost <= Decimal::ZERO || cash <= Decimal::ZERO {
        return 0;
    }
    (cash / unit_cost).floor().to_u64().unwrap_or(u64::MAX)
}
