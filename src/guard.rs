//! Phase/power guard: reads three-phase current, computes headroom against a
//! per-phase fuse limit, and steps the charging-rate setpoint toward it.

use thiserror::Error;
use crate::config::HomeSettings;
use crate::models::PhaseLoads;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("step_size must be positive")]
    InvalidStepSize,
}

pub struct PhaseGuard {
    max_power_per_phase_w: f64,
    step_size_pct: f64,
}

impl PhaseGuard {
    /// Returns a new guard. `max_power_per_phase_w = voltage * max_fuse_amps * safety_margin`.
    pub fn new(home: &HomeSettings) -> Result<Self, GuardError> {
        if home.step_size <= 0.0 {
            return Err(GuardError::InvalidStepSize);
        }
        Ok(Self {
            max_power_per_phase_w: home.voltage * home.max_fuse_current * home.safety_margin,
            step_size_pct: home.step_size,
        })
    }

    /// Computes the safe charging-rate percentage for the most loaded phase, clipped to
    /// `[0, configured_charge_rate_pct]`.
    pub fn available_charging_pct(&self, loads: PhaseLoads, configured_charge_rate_pct: f64) -> f64 {
        let l1_pct = loads.l1_w / self.max_power_per_phase_w * 100.0;
        let l2_pct = loads.l2_w / self.max_power_per_phase_w * 100.0;
        let l3_pct = loads.l3_w / self.max_power_per_phase_w * 100.0;

        let most_loaded_pct = l1_pct.max(l2_pct).max(l3_pct);
        let available_pct = 100.0 - most_loaded_pct;

        available_pct.clamp(0.0, configured_charge_rate_pct).max(0.0)
    }

    /// Steps `current_power_pct` toward `target_power_pct` by at most `step_size`,
    /// returning `None` when the adjustment is smaller than one step (no write needed).
    pub fn step_toward(&self, current_power_pct: f64, target_power_pct: f64) -> Option<f64> {
        let new_power = if target_power_pct > current_power_pct {
            (current_power_pct + self.step_size_pct).min(target_power_pct)
        } else {
            (current_power_pct - self.step_size_pct).max(target_power_pct)
        };

        if (new_power - current_power_pct).abs() >= self.step_size_pct {
            Some(new_power.round())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> HomeSettings {
        HomeSettings { voltage: 230.0, max_fuse_current: 25.0, safety_margin: 0.9, step_size: 5.0 }
    }

    #[test]
    fn available_pct_clipped_by_configured_rate() {
        let guard = PhaseGuard::new(&home()).unwrap();
        let loads = PhaseLoads { l1_w: 0.0, l2_w: 0.0, l3_w: 0.0 };
        let pct = guard.available_charging_pct(loads, 40.0);
        assert_eq!(pct, 40.0);
    }

    #[test]
    fn available_pct_drops_with_heavy_phase_load() {
        let guard = PhaseGuard::new(&home()).unwrap();
        let max_w = 230.0 * 25.0 * 0.9;
        let loads = PhaseLoads { l1_w: max_w * 0.9, l2_w: 0.0, l3_w: 0.0 };
        let pct = guard.available_charging_pct(loads, 100.0);
        assert!((pct - 10.0).abs() < 0.1);
    }

    #[test]
    fn step_below_threshold_yields_no_write() {
        let guard = PhaseGuard::new(&home()).unwrap();
        assert_eq!(guard.step_toward(40.0, 42.0), None);
    }

    #[test]
    fn step_at_or_above_threshold_moves_by_step_size() {
        let guard = PhaseGuard::new(&home()).unwrap();
        assert_eq!(guard.step_toward(40.0, 50.0), Some(45.0));
        assert_eq!(guard.step_toward(40.0, 30.0), Some(35.0));
    }
}
