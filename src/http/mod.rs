//! HTTP host: the settings/schedule surface a running facade exposes, per §6. A thin
//! axum layer over `BessFacade` — every handler just reads or patches facade state.

pub mod error;
mod root;
mod schedule;
mod settings;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::facade::BessFacade;
use crate::ports::{InverterController, PriceSource};

pub fn router<P, I>(facade: Arc<BessFacade<P, I>>) -> Router
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root::root))
        .route("/api/settings/battery", get(settings::get_battery::<P, I>).post(settings::post_battery::<P, I>))
        .route(
            "/api/settings/electricity",
            get(settings::get_electricity::<P, I>).post(settings::post_electricity::<P, I>),
        )
        .route("/api/schedule", get(schedule::get_schedule::<P, I>))
        .layer(TraceLayer::new_for_http())
        .with_state(facade)
}
