use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::facade::BessFacade;
use crate::ports::{InverterController, PriceSource};

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub date: String,
}

/// `GET /api/schedule?date=YYYY-MM-DD`: the full hourly report on success, an empty
/// array when the day's prices aren't published yet, and `501` on an optimization
/// failure (a malformed query date counts as the caller's fault, so it gets `400`).
pub async fn get_schedule<P, I>(
    State(facade): State<Arc<BessFacade<P, I>>>,
    Query(query): Query<ScheduleQuery>,
) -> Response
where
    P: PriceSource + Send + Sync + 'static,
    I: InverterController + Send + Sync + 'static,
{
    let date = match NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": format!("invalid date: {}", e)}))).into_response();
        }
    };

    match facade.schedule_report(date) {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => Json(Value::Array(vec![])).into_response(),
        Err(e) => (StatusCode::NOT_IMPLEMENTED, Json(json!({"error": e.to_string()}))).into_response(),
    }
}
