//! Canonical 24-slot plan derived from a `PlanResult`: a per-hour state tag
//! (charging/discharging/idle) alongside the action and SoE for that hour.

use crate::models::PlanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourState {
    Charging,
    Discharging,
    Idle,
}

#[derive(Debug, Clone, Copy)]
pub struct Interval {
    pub hour: usize,
    pub state: HourState,
    pub action_kwh: f64,
    pub soe_kwh: f64,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub intervals: [Interval; 24],
    pub base_cost: f64,
    pub optimized_cost: f64,
    pub savings: f64,
}

impl Schedule {
    /// Derives a canonical schedule from a planner result.
    pub fn from_plan(plan: &PlanResult) -> Self {
        let mut intervals = [Interval { hour: 0, state: HourState::Idle, action_kwh: 0.0, soe_kwh: 0.0 }; 24];
        for h in 0..24 {
            let action = plan.actions[h];
            let state = if action > 0.0 {
                HourState::Charging
            } else if action < 0.0 {
                HourState::Discharging
            } else {
                HourState::Idle
            };
            intervals[h] = Interval { hour: h, state, action_kwh: action, soe_kwh: plan.soe[h + 1] };
        }

        Schedule {
            intervals,
            base_cost: plan.base_cost,
            optimized_cost: plan.optimized_cost,
            savings: plan.savings,
        }
    }

    /// Returns `{state, action, soe}` for `hour`. Out-of-range hours return a safe
    /// idle default instead of panicking.
    pub fn get_hour_settings(&self, hour: usize) -> Interval {
        self.intervals
            .get(hour)
            .copied()
            .unwrap_or(Interval { hour, state: HourState::Idle, action_kwh: 0.0, soe_kwh: 0.0 })
    }

    /// Returns the grid-charge/discharge-rate pair the inverter should enforce at the
    /// top of `hour`, derived straight from that hour's state.
    pub fn hourly_settings(&self, hour: usize) -> HourlySettings {
        let state = self.get_hour_settings(hour).state;
        HourlySettings {
            grid_charge: state == HourState::Charging,
            discharge_rate_pct: if state == HourState::Discharging { 100 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlySettings {
    pub grid_charge: bool,
    pub discharge_rate_pct: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HourlyCost;

    fn flat_plan() -> PlanResult {
        PlanResult {
            actions: [0.0; 24],
            soe: [3.0; 25],
            hourly_costs: [HourlyCost::default(); 24],
            base_cost: 0.0,
            optimized_cost: 0.0,
            savings: 0.0,
        }
    }

    #[test]
    fn all_idle_when_no_actions() {
        let schedule = Schedule::from_plan(&flat_plan());
        assert!(schedule.intervals.iter().all(|i| i.state == HourState::Idle));
    }

    #[test]
    fn out_of_range_hour_is_safe_idle() {
        let schedule = Schedule::from_plan(&flat_plan());
        let settings = schedule.get_hour_settings(99);
        assert_eq!(settings.state, HourState::Idle);
        assert_eq!(settings.action_kwh, 0.0);
    }
}
