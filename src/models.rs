use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Static battery limits and cost parameters, mutated only via facade settings update.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatteryConfig {
    pub total_capacity_kwh: f64,
    pub min_soc_pct: f64,
    pub max_charge_discharge_kw: f64,
    pub charging_power_pct: f64,
    pub cycle_cost_per_kwh: f64,
    pub min_profit_threshold: f64,
}

impl BatteryConfig {
    pub fn reserved_kwh(&self) -> f64 {
        self.total_capacity_kwh * self.min_soc_pct / 100.0
    }

    pub fn effective_max_power_kw(&self) -> f64 {
        self.max_charge_discharge_kw * self.charging_power_pct / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Area {
    Se1,
    Se2,
    Se3,
    Se4,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Area::Se1 => "SE1",
            Area::Se2 => "SE2",
            Area::Se3 => "SE3",
            Area::Se4 => "SE4",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Area {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SE1" => Ok(Area::Se1),
            "SE2" => Ok(Area::Se2),
            "SE3" => Ok(Area::Se3),
            "SE4" => Ok(Area::Se4),
            other => Err(format!("unknown delivery area: {}", other)),
        }
    }
}

/// Retail price derivation parameters, mutated via facade settings update.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
    pub area: Area,
    pub markup: f64,
    pub vat_multiplier: f64,
    pub additional_costs: f64,
    pub tax_reduction: f64,
    pub use_actual_price: bool,
}

/// A single hourly price row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HourlyPrice {
    pub timestamp: DateTime<Local>,
    pub nordpool_price: f64,
    pub buy_price: f64,
    pub sell_price: f64,
}

impl HourlyPrice {
    pub fn new(timestamp: DateTime<Local>, nordpool_price: f64, cfg: &PriceConfig) -> Self {
        let buy_price = (nordpool_price + cfg.markup) * cfg.vat_multiplier + cfg.additional_costs;
        let sell_price = nordpool_price + cfg.tax_reduction;
        Self { timestamp, nordpool_price, buy_price, sell_price }
    }
}

/// Per-hour cost decomposition produced by the planner.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HourlyCost {
    pub base_cost: f64,
    pub grid_cost: f64,
    pub battery_cost: f64,
    pub total_cost: f64,
    pub savings: f64,
}

/// Planner output: the action vector, SoE trajectory, and cost breakdown.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub actions: [f64; 24],
    pub soe: [f64; 25],
    pub hourly_costs: [HourlyCost; 24],
    pub base_cost: f64,
    pub optimized_cost: f64,
    pub savings: f64,
}

/// Guard input: instantaneous per-phase load in watts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseLoads {
    pub l1_w: f64,
    pub l2_w: f64,
    pub l3_w: f64,
}

/// Tracks the control facade's day state machine (diagnostics only, not a control input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DayState {
    #[default]
    Idle,
    Planned,
    Active,
    RePlanning,
    DayRollover,
}
