//! Control facade: the single owner of the current configs, forecast, schedule and
//! TOU plan. Drives per-hour application, re-optimization, next-day preparation, SoC
//! feedback and settings updates; the only writer to the inverter.

use std::sync::Mutex;

use chrono::{Days, Local, NaiveDate};
use log::{info, warn};
use serde::Deserialize;

use crate::config::HomeSettings;
use crate::consumption::ConsumptionTracker;
use crate::errors::GridError;
use crate::guard::PhaseGuard;
use crate::models::{BatteryConfig, DayState, PhaseLoads, PlanResult, PriceConfig};
use crate::planner;
use crate::ports::{InverterController, PriceSource};
use crate::projector::{self, TouPlan};
use crate::schedule::Schedule;
use crate::{retry, wrapper};

/// One hour's row of the `/api/schedule` report: the price, battery trajectory and
/// cost breakdown the planner computed for that hour.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyReportRow {
    pub hour: usize,
    pub price: f64,
    pub battery_level: f64,
    pub action: f64,
    pub grid_cost: f64,
    pub battery_cost: f64,
    pub total_cost: f64,
    pub base_cost: f64,
    pub savings: f64,
}

/// Whole-day totals accompanying a schedule report.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub base_cost: f64,
    pub optimized_cost: f64,
    pub grid_costs: f64,
    pub battery_costs: f64,
    pub savings: f64,
    pub total_charged: f64,
    pub total_discharged: f64,
}

/// Full `/api/schedule?date=...` payload.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub hourly_data: Vec<HourlyReportRow>,
    pub summary: ScheduleSummary,
}

fn build_report(schedule: &Schedule, plan: &PlanResult, price_vec: &[f64; 24]) -> ScheduleReport {
    let mut hourly_data = Vec::with_capacity(24);
    let mut grid_costs = 0.0;
    let mut battery_costs = 0.0;
    let mut total_charged = 0.0;
    let mut total_discharged = 0.0;

    for h in 0..24 {
        let cost = plan.hourly_costs[h];
        let action = schedule.intervals[h].action_kwh;
        if action > 0.0 {
            total_charged += action;
        } else if action < 0.0 {
            total_discharged += -action;
        }
        grid_costs += cost.grid_cost;
        battery_costs += cost.battery_cost;

        hourly_data.push(HourlyReportRow {
            hour: h,
            price: price_vec[h],
            battery_level: schedule.intervals[h].soe_kwh,
            action,
            grid_cost: cost.grid_cost,
            battery_cost: cost.battery_cost,
            total_cost: cost.total_cost,
            base_cost: cost.base_cost,
            savings: cost.savings,
        });
    }

    ScheduleReport {
        hourly_data,
        summary: ScheduleSummary {
            base_cost: schedule.base_cost,
            optimized_cost: schedule.optimized_cost,
            grid_costs,
            battery_costs,
            savings: schedule.savings,
            total_charged,
            total_discharged,
        },
    }
}

struct FacadeState {
    battery: BatteryConfig,
    price: PriceConfig,
    home: HomeSettings,
    consumption: ConsumptionTracker,
    guard: PhaseGuard,
    schedule: Option<Schedule>,
    tou_plan: Option<TouPlan>,
    day_state: DayState,
}

/// Partial-update request body for `POST /api/settings/battery` and friends: only the
/// fields present in the patch overwrite the corresponding config value.
#[derive(Debug, Deserialize, Default)]
pub struct BatteryPatch {
    pub total_capacity_kwh: Option<f64>,
    pub min_soc_pct: Option<f64>,
    pub max_charge_discharge_kw: Option<f64>,
    pub charging_power_pct: Option<f64>,
    pub cycle_cost_per_kwh: Option<f64>,
    pub min_profit_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PricePatch {
    pub area: Option<crate::models::Area>,
    pub markup: Option<f64>,
    pub vat_multiplier: Option<f64>,
    pub additional_costs: Option<f64>,
    pub tax_reduction: Option<f64>,
    pub use_actual_price: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HomePatch {
    pub voltage: Option<f64>,
    pub max_fuse_current: Option<f64>,
    pub safety_margin: Option<f64>,
    pub step_size: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SettingsPatch {
    #[serde(default)]
    pub battery: Option<BatteryPatch>,
    #[serde(default)]
    pub price: Option<PricePatch>,
    #[serde(default)]
    pub home: Option<HomePatch>,
    #[serde(default)]
    pub consumption_default_kwh: Option<f64>,
}

fn apply_battery_patch(cfg: &mut BatteryConfig, patch: BatteryPatch) {
    if let Some(v) = patch.total_capacity_kwh {
        cfg.total_capacity_kwh = v;
    }
    if let Some(v) = patch.min_soc_pct {
        cfg.min_soc_pct = v;
    }
    if let Some(v) = patch.max_charge_discharge_kw {
        cfg.max_charge_discharge_kw = v;
    }
    if let Some(v) = patch.charging_power_pct {
        cfg.charging_power_pct = v;
    }
    if let Some(v) = patch.cycle_cost_per_kwh {
        cfg.cycle_cost_per_kwh = v;
    }
    if let Some(v) = patch.min_profit_threshold {
        cfg.min_profit_threshold = v;
    }
}

fn apply_price_patch(cfg: &mut PriceConfig, patch: PricePatch) {
    if let Some(v) = patch.area {
        cfg.area = v;
    }
    if let Some(v) = patch.markup {
        cfg.markup = v;
    }
    if let Some(v) = patch.vat_multiplier {
        cfg.vat_multiplier = v;
    }
    if let Some(v) = patch.additional_costs {
        cfg.additional_costs = v;
    }
    if let Some(v) = patch.tax_reduction {
        cfg.tax_reduction = v;
    }
    if let Some(v) = patch.use_actual_price {
        cfg.use_actual_price = v;
    }
}

fn apply_home_patch(cfg: &mut HomeSettings, patch: HomePatch) {
    if let Some(v) = patch.voltage {
        cfg.voltage = v;
    }
    if let Some(v) = patch.max_fuse_current {
        cfg.max_fuse_current = v;
    }
    if let Some(v) = patch.safety_margin {
        cfg.safety_margin = v;
    }
    if let Some(v) = patch.step_size {
        cfg.step_size = v;
    }
}

/// Resolves the price vector and cycle cost the planner should use, per §4.1's
/// price-selection rule: retail buy price with the raw cycle cost, or raw nordpool
/// price with the cycle cost scaled down by the VAT multiplier for a fair comparison.
fn planner_inputs(prices: &[crate::models::HourlyPrice], price_cfg: &PriceConfig, battery: &BatteryConfig) -> ([f64; 24], f64) {
    let mut out = [0.0; 24];
    for (h, p) in prices.iter().enumerate().take(24) {
        out[h] = if price_cfg.use_actual_price { p.buy_price } else { p.nordpool_price };
    }
    let cycle_cost = if price_cfg.use_actual_price {
        battery.cycle_cost_per_kwh
    } else {
        battery.cycle_cost_per_kwh / price_cfg.vat_multiplier
    };
    (out, cycle_cost)
}

/// Maps a leftover error from an exhausted `retry!` block to the `InverterFatal`
/// kind: by construction, whatever called this has already retried to the cap.
fn port_exhausted<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, GridError> {
    result.map_err(|e| GridError::InverterFatal(e.to_string()))
}

/// Drives the hourly arbitrage plan end to end: planning, projection, per-hour
/// inverter dispatch, phase-current throttling and settings updates. `P` and `I` are
/// the price and inverter ports; the facade owns no concrete adapter type so tests can
/// substitute fakes for both.
pub struct BessFacade<P: PriceSource, I: InverterController> {
    price_source: P,
    inverter: I,
    max_tou_segments: usize,
    default_consumption_kwh: f64,
    state: Mutex<FacadeState>,
}

impl<P: PriceSource, I: InverterController> BessFacade<P, I> {
    pub fn new(
        price_source: P,
        inverter: I,
        battery: BatteryConfig,
        price: PriceConfig,
        home: HomeSettings,
        max_tou_segments: usize,
        default_consumption_kwh: f64,
    ) -> Result<Self, GridError> {
        let guard = PhaseGuard::new(&home)?;
        let consumption = ConsumptionTracker::new(default_consumption_kwh, battery.total_capacity_kwh);

        Ok(Self {
            price_source,
            inverter,
            max_tou_segments,
            default_consumption_kwh,
            state: Mutex::new(FacadeState {
                battery,
                price,
                home,
                consumption,
                guard,
                schedule: None,
                tou_plan: None,
                day_state: DayState::Idle,
            }),
        })
    }

    pub fn battery_config(&self) -> BatteryConfig {
        self.state.lock().unwrap().battery.clone()
    }

    pub fn price_config(&self) -> PriceConfig {
        self.state.lock().unwrap().price.clone()
    }

    pub fn day_state(&self) -> DayState {
        self.state.lock().unwrap().day_state
    }

    pub fn current_schedule(&self) -> Option<Schedule> {
        self.state.lock().unwrap().schedule.clone()
    }

    /// Reads the current SoC from the inverter, defaulting to `min_soc_pct` and
    /// logging a warning on failure, per the source's degraded-read behavior.
    fn read_soc_or_default(&self, min_soc_pct: f64) -> f64 {
        match retry!(|| self.inverter.battery_soc_pct()) {
            Ok(soc) => soc,
            Err(e) => {
                warn!("failed to read battery SoC from inverter, defaulting to min_soc_pct: {}", e);
                min_soc_pct
            }
        }
    }

    fn plan_for_date(&self, date: NaiveDate) -> Result<(Schedule, PlanResult, [f64; 24]), GridError> {
        let (area, price_cfg, battery) = {
            let state = self.state.lock().unwrap();
            (state.price.area, state.price.clone(), state.battery.clone())
        };

        let prices = port_exhausted(retry!(|| self.price_source.get_prices(date, area)))?;
        if prices.len() < 24 {
            return Err(GridError::NoPrices(format!("{} rows for {}", prices.len(), date)));
        }

        let (price_vec, cycle_cost) = planner_inputs(&prices, &price_cfg, &battery);
        let soc = self.read_soc_or_default(battery.min_soc_pct);
        let consumption = self.state.lock().unwrap().consumption.predictions();

        let plan = planner::plan(&price_vec, &battery, cycle_cost, &consumption, soc)?;
        let schedule = Schedule::from_plan(&plan);
        Ok((schedule, plan, price_vec))
    }

    /// Plans `date` and returns the full hourly report without mutating the active
    /// schedule. Used by the read-only `/api/schedule` surface: `NoPrices` resolves to
    /// `None` (the host's "no data yet" response) rather than an error.
    pub fn schedule_report(&self, date: NaiveDate) -> Result<Option<ScheduleReport>, GridError> {
        match self.plan_for_date(date) {
            Ok((schedule, plan, price_vec)) => Ok(Some(build_report(&schedule, &plan, &price_vec))),
            Err(GridError::NoPrices(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Plans today, stores the new schedule and its TOU projection, and returns it.
    pub fn run_optimization(&self, date: NaiveDate) -> Result<Schedule, GridError> {
        let (schedule, _, _) = self.plan_for_date(date)?;
        let tou_plan = projector::project(&schedule, self.max_tou_segments)?;

        let mut state = self.state.lock().unwrap();
        state.schedule = Some(schedule.clone());
        state.tou_plan = Some(tou_plan);
        state.day_state = DayState::Planned;

        info!(
            "optimization for {} complete: base_cost={:.2} optimized_cost={:.2} savings={:.2}",
            date, schedule.base_cost, schedule.optimized_cost, schedule.savings
        );

        Ok(schedule)
    }

    /// Plans tomorrow and, on success, clears all existing inverter TOU segments and
    /// writes the new compact list. `NoPrices` (tomorrow not published yet) is a
    /// warning, not an error: the scheduler stays on the current plan.
    pub fn prepare_next_day(&self) -> Result<bool, GridError> {
        let tomorrow = Local::now().date_naive().checked_add_days(Days::new(1)).unwrap();

        let schedule = match self.plan_for_date(tomorrow) {
            Ok((s, _, _)) => s,
            Err(GridError::NoPrices(msg)) => {
                warn!("tomorrow's prices not ready, keeping current plan: {}", msg);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let tou_plan = projector::project(&schedule, self.max_tou_segments)?;

        port_exhausted(retry!(|| self.inverter.disable_all_tou_segments()))?;
        for seg in &tou_plan.compact {
            port_exhausted(retry!(|| self
                .inverter
                .set_tou_segment(seg.id, seg.mode, &seg.start_hhmm, &seg.end_hhmm, seg.enabled)))?;
        }

        let mut state = self.state.lock().unwrap();
        state.schedule = Some(schedule);
        state.tou_plan = Some(tou_plan);
        state.day_state = DayState::DayRollover;

        Ok(true)
    }

    /// Writes the grid-charge/discharge-rate pair for `hour` only if it differs from
    /// the inverter's current values (idempotent).
    pub fn apply_schedule(&self, hour: usize) -> Result<(), GridError> {
        let settings = {
            let mut state = self.state.lock().unwrap();
            let schedule = state
                .schedule
                .as_ref()
                .ok_or_else(|| GridError::InternalInvariant("apply_schedule called with no schedule planned".into()))?;
            let settings = schedule.hourly_settings(hour);
            state.day_state = DayState::Active;
            settings
        };

        let current_grid_charge = port_exhausted(retry!(|| self.inverter.grid_charge_enabled()))?;
        if current_grid_charge != settings.grid_charge {
            port_exhausted(retry!(|| self.inverter.set_grid_charge(settings.grid_charge)))?;
        }

        let current_discharge_rate = port_exhausted(retry!(|| self.inverter.discharging_power_rate_pct()))?;
        if current_discharge_rate != settings.discharge_rate_pct {
            port_exhausted(retry!(|| self.inverter.set_discharging_power_rate_pct(settings.discharge_rate_pct)))?;
        }

        Ok(())
    }

    /// Reads live grid import and SoC, feeds the consumption tracker, then applies the
    /// hour's schedule.
    pub fn update_state(&self, hour: usize) -> Result<(), GridError> {
        let grid_import_kw = port_exhausted(retry!(|| self.inverter.current_grid_import_kw()))?;
        let soc = retry!(|| self.inverter.battery_soc_pct()).ok();

        self.state
            .lock()
            .unwrap()
            .consumption
            .update_consumption(hour, grid_import_kw.max(0.0), soc)
            .map_err(|e| GridError::InvalidInput(e.to_string()))?;

        self.apply_schedule(hour)
    }

    /// Reads back the inverter's current grid-charge/discharge-rate settings and
    /// compares them with what `hour` expects, logging a diagnostic on drift.
    pub fn verify_inverter_settings(&self, hour: usize) -> Result<(), GridError> {
        let expected = {
            let state = self.state.lock().unwrap();
            let schedule = state
                .schedule
                .as_ref()
                .ok_or_else(|| GridError::InternalInvariant("verify called with no schedule planned".into()))?;
            schedule.hourly_settings(hour)
        };

        let grid_charge = port_exhausted(retry!(|| self.inverter.grid_charge_enabled()))?;
        let discharge_rate = port_exhausted(retry!(|| self.inverter.discharging_power_rate_pct()))?;

        if grid_charge != expected.grid_charge || discharge_rate != expected.discharge_rate_pct {
            warn!(
                "inverter settings drifted at hour {}: expected grid_charge={} discharge_rate={}, got grid_charge={} discharge_rate={}",
                hour, expected.grid_charge, expected.discharge_rate_pct, grid_charge, discharge_rate
            );
        }

        Ok(())
    }

    /// Steps the live charging-rate setpoint toward the phase-current-limited
    /// headroom. No-op while grid charging is disabled.
    pub fn adjust_charging_power(&self) -> Result<(), GridError> {
        if !port_exhausted(retry!(|| self.inverter.grid_charge_enabled()))? {
            return Ok(());
        }

        let l1 = port_exhausted(retry!(|| self.inverter.l1_current_a()))?;
        let l2 = port_exhausted(retry!(|| self.inverter.l2_current_a()))?;
        let l3 = port_exhausted(retry!(|| self.inverter.l3_current_a()))?;

        let (voltage, configured_pct) = {
            let state = self.state.lock().unwrap();
            (state.home.voltage, state.battery.charging_power_pct)
        };

        let loads = PhaseLoads { l1_w: l1 * voltage, l2_w: l2 * voltage, l3_w: l3 * voltage };
        let available_pct = self.state.lock().unwrap().guard.available_charging_pct(loads, configured_pct);

        let current_power_pct = port_exhausted(retry!(|| self.inverter.charging_power_rate_pct()))? as f64;
        let step = self.state.lock().unwrap().guard.step_toward(current_power_pct, available_pct);

        if let Some(new_pct) = step {
            port_exhausted(retry!(|| self.inverter.set_charging_power_rate_pct(new_pct as u8)))?;
        }

        Ok(())
    }

    /// Deep-merges `patch` into the battery/price/home/consumption-default sections,
    /// pushing the new price config to the price port.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<(), GridError> {
        let mut state = self.state.lock().unwrap();

        if let Some(p) = patch.battery {
            apply_battery_patch(&mut state.battery, p);
        }
        if let Some(p) = patch.price {
            apply_price_patch(&mut state.price, p);
        }
        if let Some(p) = patch.home {
            apply_home_patch(&mut state.home, p);
            state.guard = PhaseGuard::new(&state.home)?;
        }
        if let Some(default_kwh) = patch.consumption_default_kwh {
            state.consumption = ConsumptionTracker::new(default_kwh, state.battery.total_capacity_kwh);
        }

        if !(0.0 < state.battery.min_soc_pct && state.battery.min_soc_pct < 100.0) {
            return Err(GridError::InvalidInput("battery.min_soc_pct must be in (0, 100)".into()));
        }
        if state.battery.max_charge_discharge_kw <= 0.0 {
            return Err(GridError::InvalidInput("battery.max_charge_discharge_kw must be positive".into()));
        }
        if state.price.vat_multiplier < 1.0 {
            return Err(GridError::InvalidInput("price.vat_multiplier must be >= 1".into()));
        }

        state.day_state = DayState::RePlanning;

        self.price_source.update_price_config(state.price.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::Mutex;

    use chrono::{Datelike, Local, TimeZone};

    use super::*;
    use crate::models::{Area, HourlyPrice};
    use crate::projector::Mode;

    #[derive(Debug)]
    struct FakeError(String);
    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }
    impl std::error::Error for FakeError {}

    struct FakePriceSource {
        by_date: Mutex<HashMap<NaiveDate, Vec<HourlyPrice>>>,
    }

    impl FakePriceSource {
        fn flat(date: NaiveDate, price: f64) -> Self {
            let row = HourlyPrice {
                timestamp: Local.with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0).unwrap(),
                nordpool_price: price,
                buy_price: price,
                sell_price: price,
            };
            let mut by_date = HashMap::new();
            by_date.insert(date, vec![row; 24]);
            Self { by_date: Mutex::new(by_date) }
        }

        fn empty() -> Self {
            Self { by_date: Mutex::new(HashMap::new()) }
        }
    }

    impl PriceSource for FakePriceSource {
        type Error = FakeError;

        fn get_prices(&self, date: NaiveDate, _area: Area) -> Result<Vec<HourlyPrice>, Self::Error> {
            Ok(self.by_date.lock().unwrap().get(&date).cloned().unwrap_or_default())
        }

        fn update_price_config(&self, _cfg: PriceConfig) {}
    }

    #[derive(Default)]
    struct FakeInverterState {
        soc_pct: f64,
        grid_charge: bool,
        charging_power_rate_pct: u8,
        discharging_power_rate_pct: u8,
        grid_charge_writes: u32,
        discharge_rate_writes: u32,
        tou_writes: Vec<(u32, Mode, String, String)>,
        disable_all_calls: u32,
    }

    struct FakeInverter {
        state: Mutex<FakeInverterState>,
    }

    impl FakeInverter {
        fn new() -> Self {
            Self { state: Mutex::new(FakeInverterState { soc_pct: 10.0, ..Default::default() }) }
        }
    }

    impl InverterController for FakeInverter {
        type Error = FakeError;

        fn battery_soc_pct(&self) -> Result<f64, Self::Error> {
            Ok(self.state.lock().unwrap().soc_pct)
        }
        fn grid_charge_enabled(&self) -> Result<bool, Self::Error> {
            Ok(self.state.lock().unwrap().grid_charge)
        }
        fn charging_power_rate_pct(&self) -> Result<u8, Self::Error> {
            Ok(self.state.lock().unwrap().charging_power_rate_pct)
        }
        fn discharging_power_rate_pct(&self) -> Result<u8, Self::Error> {
            Ok(self.state.lock().unwrap().discharging_power_rate_pct)
        }
        fn charge_stop_soc_pct(&self) -> Result<u8, Self::Error> {
            Ok(100)
        }
        fn discharge_stop_soc_pct(&self) -> Result<u8, Self::Error> {
            Ok(0)
        }
        fn l1_current_a(&self) -> Result<f64, Self::Error> {
            Ok(0.0)
        }
        fn l2_current_a(&self) -> Result<f64, Self::Error> {
            Ok(0.0)
        }
        fn l3_current_a(&self) -> Result<f64, Self::Error> {
            Ok(0.0)
        }
        fn current_grid_import_kw(&self) -> Result<f64, Self::Error> {
            Ok(1.0)
        }
        fn set_grid_charge(&self, enabled: bool) -> Result<(), Self::Error> {
            let mut s = self.state.lock().unwrap();
            s.grid_charge = enabled;
            s.grid_charge_writes += 1;
            Ok(())
        }
        fn set_charging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error> {
            self.state.lock().unwrap().charging_power_rate_pct = pct;
            Ok(())
        }
        fn set_discharging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error> {
            let mut s = self.state.lock().unwrap();
            s.discharging_power_rate_pct = pct;
            s.discharge_rate_writes += 1;
            Ok(())
        }
        fn set_charge_stop_soc_pct(&self, _pct: u8) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_discharge_stop_soc_pct(&self, _pct: u8) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_tou_segment(
            &self,
            id: u32,
            mode: Mode,
            start_hhmm: &str,
            end_hhmm: &str,
            _enabled: bool,
        ) -> Result<(), Self::Error> {
            self.state.lock().unwrap().tou_writes.push((id, mode, start_hhmm.to_string(), end_hhmm.to_string()));
            Ok(())
        }
        fn disable_all_tou_segments(&self) -> Result<(), Self::Error> {
            self.state.lock().unwrap().disable_all_calls += 1;
            Ok(())
        }
    }

    fn battery() -> BatteryConfig {
        BatteryConfig {
            total_capacity_kwh: 30.0,
            min_soc_pct: 10.0,
            max_charge_discharge_kw: 15.0,
            charging_power_pct: 40.0,
            cycle_cost_per_kwh: 0.5,
            min_profit_threshold: 0.2,
        }
    }

    fn price_cfg() -> PriceConfig {
        PriceConfig {
            area: Area::Se3,
            markup: 0.0,
            vat_multiplier: 1.25,
            additional_costs: 0.0,
            tax_reduction: 0.0,
            use_actual_price: false,
        }
    }

    fn home_cfg() -> HomeSettings {
        HomeSettings { voltage: 230.0, max_fuse_current: 25.0, safety_margin: 0.9, step_size: 5.0 }
    }

    fn facade(price_source: FakePriceSource, inverter: FakeInverter) -> BessFacade<FakePriceSource, FakeInverter> {
        BessFacade::new(price_source, inverter, battery(), price_cfg(), home_cfg(), 8, 5.2).unwrap()
    }

    #[test]
    fn run_optimization_stores_schedule_and_transitions_to_planned() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let f = facade(FakePriceSource::flat(date, 1.0), FakeInverter::new());

        let schedule = f.run_optimization(date).unwrap();
        assert_eq!(schedule.base_cost, f.current_schedule().unwrap().base_cost);
        assert_eq!(f.day_state(), DayState::Planned);
    }

    #[test]
    fn prepare_next_day_returns_false_without_mutating_schedule_when_no_prices() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let f = facade(FakePriceSource::flat(today, 1.0), FakeInverter::new());
        f.run_optimization(today).unwrap();

        let result = f.prepare_next_day().unwrap();
        assert!(!result);
        assert_eq!(f.day_state(), DayState::Planned);
    }

    #[test]
    fn apply_schedule_is_idempotent_when_inverter_already_matches() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let f = facade(FakePriceSource::flat(date, 1.0), FakeInverter::new());
        f.run_optimization(date).unwrap();

        f.apply_schedule(0).unwrap();
        f.apply_schedule(0).unwrap();

        let state = f.inverter.state.lock().unwrap();
        assert!(state.grid_charge_writes <= 1);
        assert!(state.discharge_rate_writes <= 1);
    }

    #[test]
    fn update_settings_rejects_invalid_min_soc() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let f = facade(FakePriceSource::flat(date, 1.0), FakeInverter::new());

        let patch = SettingsPatch {
            battery: Some(BatteryPatch { min_soc_pct: Some(150.0), ..Default::default() }),
            ..Default::default()
        };
        assert!(f.update_settings(patch).is_err());
    }

    #[test]
    fn empty_price_rows_yield_no_prices_error_on_run_optimization() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let f = facade(FakePriceSource::empty(), FakeInverter::new());
        match f.run_optimization(date) {
            Err(GridError::NoPrices(_)) => {}
            other => panic!("expected NoPrices, got {:?}", other.is_ok()),
        }
    }
}
