//! External collaborators treated as ports: price acquisition and the
//! concrete inverter transport. Concrete adapters live in
//! `manager_nordpool` and `manager_fox_cloud`.

use chrono::NaiveDate;
use crate::models::{Area, HourlyPrice, PriceConfig};

pub trait PriceSource {
    type Error: std::error::Error;

    /// Returns 24 hourly rows in local time starting at 00:00. May return an empty
    /// vector when prices are not yet published (typically tomorrow's).
    fn get_prices(&self, date: NaiveDate, area: Area) -> Result<Vec<HourlyPrice>, Self::Error>;

    /// Replaces the VAT/markup configuration used to derive buy/sell prices from the
    /// raw day-ahead feed, so a settings update takes effect on the very next call.
    fn update_price_config(&self, cfg: PriceConfig);
}

pub trait InverterController {
    type Error: std::error::Error;

    fn battery_soc_pct(&self) -> Result<f64, Self::Error>;
    fn grid_charge_enabled(&self) -> Result<bool, Self::Error>;
    fn charging_power_rate_pct(&self) -> Result<u8, Self::Error>;
    fn discharging_power_rate_pct(&self) -> Result<u8, Self::Error>;
    fn charge_stop_soc_pct(&self) -> Result<u8, Self::Error>;
    fn discharge_stop_soc_pct(&self) -> Result<u8, Self::Error>;
    fn l1_current_a(&self) -> Result<f64, Self::Error>;
    fn l2_current_a(&self) -> Result<f64, Self::Error>;
    fn l3_current_a(&self) -> Result<f64, Self::Error>;
    fn current_grid_import_kw(&self) -> Result<f64, Self::Error>;

    fn set_grid_charge(&self, enabled: bool) -> Result<(), Self::Error>;
    fn set_charging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error>;
    fn set_discharging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error>;
    fn set_charge_stop_soc_pct(&self, pct: u8) -> Result<(), Self::Error>;
    fn set_discharge_stop_soc_pct(&self, pct: u8) -> Result<(), Self::Error>;
    fn set_tou_segment(
        &self,
        id: u32,
        mode: crate::projector::Mode,
        start_hhmm: &str,
        end_hhmm: &str,
        enabled: bool,
    ) -> Result<(), Self::Error>;
    fn disable_all_tou_segments(&self) -> Result<(), Self::Error>;
}
