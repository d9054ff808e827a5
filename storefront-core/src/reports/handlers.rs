use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::StoreResult;
use crate::reports::ReportTable;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Month token for the monthly reports
    pub param: Option<String>,
}

/// Runs one report from the catalog.
///
/// `GET /reports/:id?param=YYYY-MM`
pub async fn run_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> StoreResult<Json<ReportTable>> {
    let table = state
        .reports()
        .run_by_id(id, query.param.as_deref())
        .await?;
    Ok(Json(table))
}
