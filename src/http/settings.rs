use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::facade::{BatteryPatch, BessFacade, PricePatch, SettingsPatch};
use crate::models::{BatteryConfig, PriceConfig};
use crate::ports::{InverterController, PriceSource};

use super::error::ApiError;

pub async fn get_battery<P, I>(State(facade): State<Arc<BessFacade<P, I>>>) -> Json<BatteryConfig>
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    Json(facade.battery_config())
}

pub async fn post_battery<P, I>(
    State(facade): State<Arc<BessFacade<P, I>>>,
    Json(patch): Json<BatteryPatch>,
) -> Result<Json<BatteryConfig>, ApiError>
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    let settings_patch = SettingsPatch { battery: Some(patch), ..Default::default() };
    facade.update_settings(settings_patch)?;
    Ok(Json(facade.battery_config()))
}

pub async fn get_electricity<P, I>(State(facade): State<Arc<BessFacade<P, I>>>) -> Json<PriceConfig>
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    Json(facade.price_config())
}

pub async fn post_electricity<P, I>(
    State(facade): State<Arc<BessFacade<P, I>>>,
    Json(patch): Json<PricePatch>,
) -> Result<Json<PriceConfig>, ApiError>
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    let settings_patch = SettingsPatch { price: Some(patch), ..Default::default() };
    facade.update_settings(settings_patch)?;
    Ok(Json(facade.price_config()))
}
