#![deny(warnings)]

//! Headless CLI: plays an operator plan through the day-cycle engine and
//! prints the history table and end-of-run summary.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use sim_core::{DayInput, SimConfig};
use sim_report::{Report, ReportBuilder};
use sim_runtime::DayCycleEngine;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DAYS: u32 = 5;
const DEFAULT_PRICE: i64 = 15;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    plan: Option<String>,
    days: Option<u32>,
    price: Option<Decimal>,
    produce: Option<u64>,
    seed: Option<u64>,
    json: bool,
    version: bool,
}

/// Operator decisions, one entry per day.
#[derive(Debug, Deserialize)]
struct PlanFile {
    days: Vec<DayInput>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--plan" => args.plan = it.next(),
            "--days" => args.days = it.next().and_then(|s| s.parse().ok()),
            "--price" => {
                let raw = it.next().unwrap_or_default();
                args.price = Some(Decimal::from_str(&raw).with_context(|| format!("bad --price {raw:?}"))?);
            }
            "--produce" => args.produce = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            "--version" => args.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn load_plan(args: &Args, cfg: &SimConfig) -> Result<Vec<DayInput>> {
    if let Some(path) = &args.plan {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading plan {path}"))?;
        let plan: PlanFile =
            serde_yaml::from_str(&text).with_context(|| format!("parsing plan {path}"))?;
        return Ok(plan.days);
    }
    let days = args.days.or(cfg.days).unwrap_or(DEFAULT_DAYS);
    let price = args
        .price
        .unwrap_or_else(|| (cfg.min_price + Decimal::new(5, 0)).max(Decimal::new(DEFAULT_PRICE, 0)));
    let quantity = args.produce.unwrap_or(0);
    Ok(vec![DayInput::new(price, quantity); days as usize])
}

fn print_report(report: &Report) {
    println!(
        "{:>4} {:<30} {:>8} {:>8} {:>6} {:>6} {:>5} {:>10} {:>10} {:>10} {:>6} {:>10} {:>10} {:>10}",
        "Day", "Scenario", "Price", "Cost", "Made", "Sold", "Lost", "Revenue", "COGS", "Profit", "Inv", "Inv $", "Inv Cost", "Cash"
    );
    for r in &report.rows {
        println!(
            "{:>4} {:<30} {:>8} {:>8} {:>6} {:>6} {:>5} {:>10} {:>10} {:>10} {:>6} {:>10} {:>10} {:>10}",
            r.day_index,
            r.scenario,
            r.price.round_dp(2),
            r.production_cost.round_dp(2),
            r.units_produced,
            r.units_sold,
            r.lost_sales,
            r.revenue.round_dp(2),
            r.cogs.round_dp(2),
            r.profit.round_dp(2),
            r.inventory_units,
            r.inventory_at_price.round_dp(2),
            r.inventory_value.round_dp(2),
            r.cash_after.round_dp(2),
        );
    }
    let s = &report.summary;
    println!(
        "Totals | revenue: ${} | spent: ${} | COGS: ${} | profit: ${} | lost sales: {}",
        s.total_revenue.round_dp(2),
        s.total_spend.round_dp(2),
        s.total_cogs.round_dp(2),
        s.total_profit.round_dp(2),
        s.total_lost_sales
    );
    println!(
        "Cash | start: ${} | final: ${} | cash profit: ${}",
        s.starting_cash.round_dp(2),
        s.final_cash.round_dp(2),
        s.cash_profit.round_dp(2)
    );
    println!(
        "Inventory | units: {} | at cost: ${} | at last price: ${} | total value: ${} | value created: ${}",
        s.inventory_units,
        s.inventory_at_cost.round_dp(2),
        s.inventory_at_price.round_dp(2),
        s.total_value.round_dp(2),
        s.total_value_created.round_dp(2)
    );
}

/// `RUST_LOG` directives when they parse, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    if args.version {
        println!("toyshop {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    info!(?args, "starting CLI");

    let mut cfg = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        cfg.random_seed = args.seed;
    }
    if args.days.is_some() {
        cfg.days = args.days;
    }
    let plan = load_plan(&args, &cfg)?;
    if plan.is_empty() {
        bail!("plan has no days");
    }

    let mut engine = DayCycleEngine::try_new(cfg)?;
    for input in plan {
        if engine.is_finished() {
            warn!(day = engine.day_index(), "run complete; ignoring remaining plan");
            break;
        }
        engine
            .submit(input)
            .with_context(|| format!("day {}", engine.day_index()))?;
    }

    let snap = engine.get_run_snapshot();
    let report = ReportBuilder::from_snapshot(&snap);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Run seed: {}", snap.seed);
        print_report(&report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_can_enable_engine_debug_lines() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(Some("sim_runtime=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }
}
