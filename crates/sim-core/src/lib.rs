#![deny(warnings)]

//! Core domain models and invariants for the Toy Shop simulator.
//!
//! This crate defines the serializable types shared by the economic models,
//! the day-cycle engine and the reporting layer, together with the
//! configuration surface and the error taxonomy.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A named daily modifier applied to customer demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMultiplier {
    /// Short name, e.g. "Holiday Season".
    pub name: String,
    /// One-line story shown to the operator.
    #[serde(default)]
    pub narrative: String,
    /// Multiplicative factor (>= 0). 1.0 leaves demand unchanged.
    pub factor: Decimal,
}

impl ScenarioMultiplier {
    pub fn new(name: impl Into<String>, narrative: impl Into<String>, factor: Decimal) -> Self {
        Self {
            name: name.into(),
            narrative: narrative.into(),
            factor,
        }
    }

    /// A scenario that leaves demand untouched.
    pub fn neutral() -> Self {
        Self::new("Ordinary Day", "Business as usual.", Decimal::ONE)
    }
}

/// The built-in daily scenario table.
pub fn default_scenarios() -> Vec<ScenarioMultiplier> {
    let s = |name: &str, narrative: &str, hundredths: i64| {
        ScenarioMultiplier::new(name, narrative, Decimal::new(hundredths, 2))
    };
    vec![
        s(
            "Holiday Season",
            "Parents are eager to buy toys for their children. Demand is significantly higher than usual.",
            180,
        ),
        s(
            "Economic Recession",
            "Customers are careful with their spending and demand for toys has decreased.",
            60,
        ),
        s(
            "New Competitor Opens",
            "A new toy shop nearby offers similar products, reducing your demand.",
            70,
        ),
        s(
            "Successful Marketing Campaign",
            "More customers are aware of your shop and demand has increased.",
            130,
        ),
        s(
            "Back to School",
            "Parents focus on school supplies; only educational toys keep some interest.",
            80,
        ),
        s(
            "Local Festival",
            "Increased foot traffic from a local festival brings more customers.",
            150,
        ),
        s(
            "Product Recall in Industry",
            "A competitor's recall made customers cautious. Demand is temporarily lower.",
            65,
        ),
        s(
            "Celebrity Endorsement",
            "A celebrity mentioned your toys on social media and interest has surged.",
            160,
        ),
        s(
            "Rainy Weekend",
            "Families are looking for indoor activities and visit toy shops more.",
            120,
        ),
        s(
            "Supply Chain Issues",
            "Customers fear shortages and buy proactively.",
            140,
        ),
    ]
}

/// How the scenario for a given day is chosen from the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMode {
    /// Day `d` uses entry `(d - 1) % len`.
    Cycle,
    /// Day `d` draws a uniformly random entry from a seeded per-day stream.
    #[default]
    Random,
}

/// What the scenario factor scales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierTarget {
    /// `max(0, base + coefficient * price) * factor`.
    #[default]
    Demand,
    /// `max(0, base + coefficient * factor * price)`.
    Sensitivity,
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Customers at a price of zero.
    pub base_demand: Decimal,
    /// Demand change per unit of price (<= 0).
    pub coefficient: Decimal,
    /// Lower bound of the daily unit production cost.
    pub min_cost: Decimal,
    /// Upper bound of the daily unit production cost.
    pub max_cost: Decimal,
    /// Decimal places kept when sampling unit costs (0 = whole currency units).
    pub cost_precision: u32,
    /// Daily scenarios.
    pub scenario_table: Vec<ScenarioMultiplier>,
    /// How a day's scenario is picked.
    pub scenario_mode: ScenarioMode,
    /// What the scenario factor applies to.
    pub multiplier_target: MultiplierTarget,
    /// Seed for deterministic RNG; drawn from entropy when absent.
    pub random_seed: Option<u64>,
    /// Number of days in the run; unbounded when absent.
    pub days: Option<u32>,
    /// Cash at the start of day 1.
    pub starting_cash: Decimal,
    /// Units already in stock before day 1.
    pub starting_inventory: u64,
    /// Cost basis of the starting stock; `min_cost` when absent.
    pub starting_unit_cost: Option<Decimal>,
    /// Lowest accepted selling price.
    pub min_price: Decimal,
    /// Reject production the cash balance cannot pay for.
    pub enforce_cash: bool,
    /// Calendar date of day 1, if the run is dated.
    pub start_date: Option<NaiveDate>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_demand: Decimal::new(60, 0),
            coefficient: Decimal::new(-2, 0),
            min_cost: Decimal::new(8, 0),
            max_cost: Decimal::new(18, 0),
            cost_precision: DEFAULT_COST_PRECISION,
            scenario_table: default_scenarios(),
            scenario_mode: ScenarioMode::default(),
            multiplier_target: MultiplierTarget::default(),
            random_seed: None,
            days: None,
            starting_cash: Decimal::new(200, 0),
            starting_inventory: 0,
            starting_unit_cost: None,
            min_price: Decimal::ZERO,
            enforce_cash: false,
            start_date: None,
        }
    }
}

/// Whole-currency costs unless configured otherwise.
pub const DEFAULT_COST_PRECISION: u32 = 0;

/// Largest supported `cost_precision`.
pub const MAX_COST_PRECISION: u32 = 8;

impl SimConfig {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_yaml_str(&text)
    }

    /// Check every option and their consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cost_range(self.min_cost, self.max_cost)?;
        if self.base_demand < Decimal::ZERO {
            return Err(ConfigError::NegativeBaseDemand);
        }
        if self.coefficient > Decimal::ZERO {
            return Err(ConfigError::PositiveCoefficient(self.coefficient));
        }
        if self.cost_precision > MAX_COST_PRECISION {
            return Err(ConfigError::InvalidCostPrecision(self.cost_precision));
        }
        if self.scenario_table.is_empty() {
            return Err(ConfigError::EmptyScenarioTable);
        }
        for s in &self.scenario_table {
            if s.name.trim().is_empty() || s.factor < Decimal::ZERO {
                return Err(ConfigError::InvalidMultiplier(s.name.clone()));
            }
        }
        if self.starting_cash < Decimal::ZERO {
            return Err(ConfigError::NegativeStartingCash);
        }
        if matches!(self.starting_unit_cost, Some(c) if c < Decimal::ZERO) {
            return Err(ConfigError::NegativeCost);
        }
        if self.min_price < Decimal::ZERO {
            return Err(ConfigError::NegativeMinPrice);
        }
        if Decimal::from(self.starting_inventory)
            .checked_mul(self.starting_unit_cost())
            .is_none()
        {
            return Err(ConfigError::OpeningStockOverflow);
        }
        Ok(())
    }

    /// Cost basis booked for the starting stock.
    pub fn starting_unit_cost(&self) -> Decimal {
        self.starting_unit_cost
            .unwrap_or(self.min_cost)
            .max(Decimal::ZERO)
    }
}

/// Validate a unit cost range: both bounds non-negative and `min <= max`.
pub fn validate_cost_range(min: Decimal, max: Decimal) -> Result<(), ConfigError> {
    if min < Decimal::ZERO || max < Decimal::ZERO {
        return Err(ConfigError::NegativeCost);
    }
    if min > max {
        return Err(ConfigError::InvalidCostRange { min, max });
    }
    Ok(())
}

/// Operator decisions for one day.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayInput {
    /// Selling price per unit (>= 0).
    pub price: Decimal,
    /// Units to produce today.
    #[serde(alias = "produce")]
    pub quantity: u64,
}

impl DayInput {
    pub fn new(price: Decimal, quantity: u64) -> Self {
        Self { price, quantity }
    }

    /// Build from a signed quantity as received from an untyped caller.
    pub fn try_new(price: Decimal, quantity: i64) -> Result<Self, InputError> {
        let quantity = u64::try_from(quantity).map_err(|_| InputError::NegativeQuantity(quantity))?;
        let input = Self { price, quantity };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.price < Decimal::ZERO {
            return Err(InputError::NegativePrice(self.price));
        }
        Ok(())
    }
}

/// Units on hand and their weighted-average cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryState {
    /// Units in stock.
    pub units_on_hand: u64,
    /// Weighted-average unit cost; zero when the stock is empty.
    pub avg_cost: Decimal,
}

impl InventoryState {
    /// Inventory valued at cost: `units_on_hand * avg_cost`.
    pub fn value(&self) -> Decimal {
        Decimal::from(self.units_on_hand).saturating_mul(self.avg_cost)
    }
}

/// Immutable outcome of one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// 1-based day number.
    pub day_index: u32,
    /// Calendar date, when the run is dated.
    pub date: Option<NaiveDate>,
    /// Scenario in effect.
    pub scenario: String,
    /// Scenario factor in effect.
    pub factor: Decimal,
    /// Selling price.
    pub price: Decimal,
    /// Units produced.
    pub units_produced: u64,
    /// Sampled unit production cost.
    pub production_cost: Decimal,
    /// Cash paid for production: `units_produced * production_cost`.
    pub production_spend: Decimal,
    /// Customer demand at the chosen price.
    pub demand: u64,
    /// Units actually sold, `min(demand, stock)`.
    pub units_sold: u64,
    /// Demand left unserved.
    pub lost_sales: u64,
    /// `units_sold * price`.
    pub revenue: Decimal,
    /// Cost of goods sold at the average cost.
    pub cogs: Decimal,
    /// `revenue - cogs`.
    pub profit: Decimal,
    /// Cash balance after the day settles.
    pub cash_after: Decimal,
    /// Inventory after the day settles.
    pub ending_inventory: InventoryState,
}

/// Read-only view of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Seed driving cost and scenario draws.
    pub seed: u64,
    /// Day that the next submission will simulate.
    pub next_day: u32,
    /// Cash at the start of the run.
    pub starting_cash: Decimal,
    /// Current cash balance.
    pub cash: Decimal,
    /// Current inventory.
    pub inventory: InventoryState,
    /// Reported days, in order.
    pub records: Vec<DayRecord>,
}

/// Invalid or inconsistent configuration. Fatal for the run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Cost range with `min > max`.
    #[error("invalid cost range: min {min} > max {max}")]
    InvalidCostRange { min: Decimal, max: Decimal },
    /// Costs must be non-negative.
    #[error("production cost must be >= 0")]
    NegativeCost,
    /// Base demand must be non-negative.
    #[error("base demand must be >= 0")]
    NegativeBaseDemand,
    /// Higher prices must not raise demand.
    #[error("demand coefficient must be <= 0, got {0}")]
    PositiveCoefficient(Decimal),
    /// At least one scenario is required.
    #[error("scenario table is empty")]
    EmptyScenarioTable,
    /// Scenario without a name or with a negative factor.
    #[error("invalid scenario multiplier: {0:?}")]
    InvalidMultiplier(String),
    /// Starting cash must be non-negative.
    #[error("starting cash must be >= 0")]
    NegativeStartingCash,
    /// Minimum price must be non-negative.
    #[error("minimum price must be >= 0")]
    NegativeMinPrice,
    /// Cost precision above the supported maximum.
    #[error("cost precision {0} exceeds {max} decimal places", max = MAX_COST_PRECISION)]
    InvalidCostPrecision(u32),
    /// Opening stock whose cost basis does not fit in a `Decimal`.
    #[error("opening stock cost basis is out of range")]
    OpeningStockOverflow,
    /// Malformed configuration document.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
}

/// Invalid per-day operator input. The caller may retry with corrected input.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("price must be >= 0, got {0}")]
    NegativePrice(Decimal),
    #[error("production quantity must be >= 0, got {0}")]
    NegativeQuantity(i64),
    #[error("price {price} is below the minimum of {min}")]
    PriceBelowMinimum { price: Decimal, min: Decimal },
    #[error("production costs {required} but only {available} cash is available")]
    InsufficientCash { required: Decimal, available: Decimal },
    #[error("cannot sell {requested} units with {on_hand} on hand")]
    InsufficientStock { requested: u64, on_hand: u64 },
    #[error("the run is complete after {0} days")]
    HorizonReached(u32),
    /// A day total that does not fit in its numeric type.
    #[error("{0} is out of range for this day")]
    OutOfRange(&'static str),
}

/// Any failure surfaced by the simulator.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    /// A submission panicked while holding a shared run; its state is not trusted.
    #[error("the shared run was abandoned mid-day and is no longer readable")]
    RunPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SimConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.scenario_table.len(), 10);
        assert_eq!(cfg.starting_unit_cost(), Decimal::new(8, 0));
    }

    #[test]
    fn inverted_cost_range_is_rejected() {
        let cfg = SimConfig {
            min_cost: Decimal::new(3, 0),
            max_cost: Decimal::new(2, 0),
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidCostRange {
                min: Decimal::new(3, 0),
                max: Decimal::new(2, 0)
            })
        );
    }

    #[test]
    fn rejects_inconsistent_options() {
        let positive_coeff = SimConfig {
            coefficient: Decimal::new(1, 0),
            ..SimConfig::default()
        };
        assert!(matches!(
            positive_coeff.validate(),
            Err(ConfigError::PositiveCoefficient(_))
        ));

        let empty = SimConfig {
            scenario_table: vec![],
            ..SimConfig::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyScenarioTable));

        let bad_factor = SimConfig {
            scenario_table: vec![ScenarioMultiplier::new("Slump", "", Decimal::new(-1, 0))],
            ..SimConfig::default()
        };
        assert_eq!(
            bad_factor.validate(),
            Err(ConfigError::InvalidMultiplier("Slump".into()))
        );

        let precise = SimConfig {
            cost_precision: 12,
            ..SimConfig::default()
        };
        assert_eq!(precise.validate(), Err(ConfigError::InvalidCostPrecision(12)));

        let hoard = SimConfig {
            starting_inventory: u64::MAX,
            starting_unit_cost: Some(Decimal::MAX),
            ..SimConfig::default()
        };
        assert_eq!(hoard.validate(), Err(ConfigError::OpeningStockOverflow));
    }

    #[test]
    fn inventory_value_saturates() {
        let inv = InventoryState {
            units_on_hand: u64::MAX,
            avg_cost: Decimal::MAX,
        };
        assert_eq!(inv.value(), Decimal::MAX);
    }

    #[test]
    fn yaml_partial_config_uses_defaults() {
        let text = r#"
base_demand: 100
coefficient: -2
random_seed: 7
days: 5
scenario_mode: cycle
scenario_table:
  - name: Holiday
    factor: 1.5
start_date: 2024-12-01
"#;
        let cfg = SimConfig::from_yaml_str(text).unwrap();
        assert_eq!(cfg.base_demand, Decimal::new(100, 0));
        assert_eq!(cfg.random_seed, Some(7));
        assert_eq!(cfg.days, Some(5));
        assert_eq!(cfg.scenario_mode, ScenarioMode::Cycle);
        assert_eq!(cfg.scenario_table[0].factor, Decimal::new(15, 1));
        assert_eq!(cfg.min_cost, Decimal::new(8, 0));
        assert_eq!(cfg.start_date, NaiveDate::from_ymd_opt(2024, 12, 1));
    }

    #[test]
    fn yaml_invalid_config_fails_fast() {
        let err = SimConfig::from_yaml_str("min_cost: 3\nmax_cost: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCostRange { .. }));
        let err = SimConfig::from_yaml_str("base_demand: [1, 2]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bundled_configs_load() {
        let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/configs");
        let classic = SimConfig::load(root.join("classic.yaml")).unwrap();
        assert_eq!(classic.days, Some(5));
        assert!(classic.enforce_cash);
        assert_eq!(classic.multiplier_target, MultiplierTarget::Sensitivity);
        assert_eq!(classic.scenario_table, default_scenarios());

        let holiday = SimConfig::load(root.join("holiday_week.yaml")).unwrap();
        assert_eq!(holiday.min_cost, Decimal::new(450, 2));
        assert_eq!(holiday.scenario_table.len(), 3);
        assert_eq!(holiday.scenario_table[2].narrative, "");
        assert_eq!(holiday.starting_unit_cost(), Decimal::new(5, 0));
    }

    #[test]
    fn plan_entries_accept_produce_key() {
        let input: DayInput = serde_yaml::from_str("{ price: 20, produce: 60 }").unwrap();
        assert_eq!(input, DayInput::new(Decimal::new(20, 0), 60));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = SimConfig::load("/nonexistent/toyshop.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn day_input_rejects_negatives() {
        assert_eq!(
            DayInput::try_new(Decimal::new(10, 0), -1),
            Err(InputError::NegativeQuantity(-1))
        );
        assert_eq!(
            DayInput::try_new(Decimal::new(-1, 0), 5),
            Err(InputError::NegativePrice(Decimal::new(-1, 0)))
        );
        let ok = DayInput::try_new(Decimal::ZERO, 0).unwrap();
        assert_eq!(ok.quantity, 0);
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = DayRecord {
            day_index: 1,
            date: None,
            scenario: "Holiday Season".into(),
            factor: Decimal::new(18, 1),
            price: Decimal::new(15, 0),
            units_produced: 10,
            production_cost: Decimal::new(8, 0),
            production_spend: Decimal::new(80, 0),
            demand: 12,
            units_sold: 10,
            lost_sales: 2,
            revenue: Decimal::new(150, 0),
            cogs: Decimal::new(80, 0),
            profit: Decimal::new(70, 0),
            cash_after: Decimal::new(270, 0),
            ending_inventory: InventoryState::default(),
        };
        let s = serde_json::to_string(&rec).unwrap();
        let back: DayRecord = serde_json::from_str(&s).unwrap();
        assert_eq!(back, rec);
    }

    proptest! {
        #[test]
        fn ordered_cost_ranges_validate(lo in 0i64..10_000, span in 0i64..10_000) {
            let min = Decimal::new(lo, 2);
            let max = Decimal::new(lo + span, 2);
            prop_assert!(validate_cost_range(min, max).is_ok());
            if span > 0 {
                prop_assert!(validate_cost_range(max, min).is_err());
            }
        }

        #[test]
        fn inventory_value_is_units_times_cost(units in 0u64..1_000_000, cents in 0i64..100_000) {
            let inv = InventoryState { units_on_hand: units, avg_cost: Decimal::new(cents, 2) };
            prop_assert_eq!(inv.value(), Decimal::from(units) * Decimal::new(cents, 2));
        }
    }
}
