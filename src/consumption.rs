//! Per-hour household consumption forecast, updated from observed grid draw
//! and SoC deltas.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumptionError {
    #[error("invalid hour: {0}")]
    InvalidHour(usize),
    #[error("invalid grid import: {0}")]
    InvalidGridImport(f64),
    #[error("invalid soc: {0}")]
    InvalidSoc(f64),
}

const MIN_VALID_KWH: f64 = 0.1;

/// Tracks a 24-slot consumption forecast, feeding back observed actuals.
pub struct ConsumptionTracker {
    total_capacity_kwh: f64,
    predictions: [f64; 24],
    actuals: Vec<(usize, f64)>,
    soc_samples: [Option<f64>; 24],
}

impl ConsumptionTracker {
    /// Returns a new tracker with every hour initialized to `default_hourly_kwh`.
    pub fn new(default_hourly_kwh: f64, total_capacity_kwh: f64) -> Self {
        Self {
            total_capacity_kwh,
            predictions: [default_hourly_kwh; 24],
            actuals: Vec::new(),
            soc_samples: [None; 24],
        }
    }

    pub fn predictions(&self) -> [f64; 24] {
        self.predictions
    }

    pub fn actual_consumption(&self, hour: usize) -> Option<f64> {
        self.actuals.iter().rev().find(|(h, _)| *h == hour).map(|(_, v)| *v)
    }

    /// Energy change attributable to the battery between `hour-1` and `hour`, positive
    /// when charging (consuming extra grid energy), `None` if either sample is missing.
    fn energy_change(&self, hour: usize) -> Option<f64> {
        let soc = self.soc_samples[hour]?;
        let prev_hour = (hour + 23) % 24;
        let prev_soc = self.soc_samples[prev_hour]?;
        Some((soc - prev_soc) / 100.0 * self.total_capacity_kwh)
    }

    /// Records observed grid import (and optionally SoC) for `hour`, recomputing that
    /// hour's actual load and, once at least 3 actuals are known, replacing predictions
    /// for every later hour with the mean of the 3 most recently recorded actuals.
    pub fn update_consumption(
        &mut self,
        hour: usize,
        grid_import_kwh: f64,
        soc_pct: Option<f64>,
    ) -> Result<(), ConsumptionError> {
        if hour > 23 {
            return Err(ConsumptionError::InvalidHour(hour));
        }
        if grid_import_kwh < 0.0 {
            return Err(ConsumptionError::InvalidGridImport(grid_import_kwh));
        }
        if let Some(soc) = soc_pct {
            if !(0.0..=100.0).contains(&soc) {
                return Err(ConsumptionError::InvalidSoc(soc));
            }
            self.soc_samples[hour] = Some(soc);
        }

        let energy_change = self.energy_change(hour);
        let actual = grid_import_kwh + energy_change.unwrap_or(0.0);
        let actual = actual.max(MIN_VALID_KWH);

        self.actuals.retain(|(h, _)| *h != hour);
        self.actuals.push((hour, actual));

        self.update_predictions(hour);

        Ok(())
    }

    fn update_predictions(&mut self, current_hour: usize) {
        if self.actuals.len() < 3 {
            return;
        }

        let recent: f64 = self.actuals[self.actuals.len() - 3..].iter().map(|(_, v)| v).sum();
        let new_prediction = recent / 3.0;

        for hour in (current_hour + 1)..24 {
            self.predictions[hour] = new_prediction;
        }
    }

    /// Clears actuals and SoC samples for a new day; predictions are preserved.
    pub fn reset_daily(&mut self) {
        self.actuals.clear();
        self.soc_samples = [None; 24];
    }
}
