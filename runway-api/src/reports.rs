use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use runway_ticketing::{ReportInterval, SalesRow};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub interval: String,
}

pub async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<SalesRow>>, AppError> {
    let interval: ReportInterval = query.interval.parse()?;
    Ok(Json(state.reports.build(interval).await?))
}
