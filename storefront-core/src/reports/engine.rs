use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool, TypeInfo, ValueRef};
use tracing::{info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::models::date_to_db;
use crate::reports::catalog::{Report, ReportParam};

/// One report cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

/// Result of running a report: named columns and ordered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub report: u8,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ReportValue>>,
}

/// Runs the canned, read-only reports.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    pool: SqlitePool,
}

impl ReportEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Runs report number `id`.
    ///
    /// # Arguments
    ///
    /// * `id` - Menu number of the report, 1 to 20
    /// * `param` - `YYYY-MM` token for the month reports, ignored otherwise
    ///
    /// # Errors
    ///
    /// `NotFound` for any number outside the catalog (including ones that
    /// do not fit a report id at all), `Validation` for a bad month token.
    pub async fn run_by_id(&self, id: i64, param: Option<&str>) -> StoreResult<ReportTable> {
        let report = u8::try_from(id)
            .ok()
            .and_then(Report::from_id)
            .ok_or_else(|| StoreError::not_found("report", id))?;
        self.run(report, param).await
    }

    pub async fn run(&self, report: Report, param: Option<&str>) -> StoreResult<ReportTable> {
        self.run_at(report, param, Local::now().naive_local()).await
    }

    /// Runs `report` with relative date windows measured from `now`.
    ///
    /// `param` is only read by month reports, which require a `YYYY-MM`
    /// token.
    #[instrument(skip(self), fields(report = report.id()))]
    pub async fn run_at(
        &self,
        report: Report,
        param: Option<&str>,
        now: NaiveDateTime,
    ) -> StoreResult<ReportTable> {
        let mut query = sqlx::query(report.sql());
        match report.param() {
            ReportParam::None => {}
            ReportParam::Month => {
                query = query.bind(parse_month(param)?);
            }
            ReportParam::SinceDays(days) => {
                query = query.bind(date_to_db(now - Duration::days(days)));
            }
        }

        let rows = query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(decode_row)
            .collect::<StoreResult<Vec<_>>>()?;

        info!(rows = rows.len(), "Report finished");

        Ok(ReportTable {
            report: report.id(),
            title: report.title().to_string(),
            columns: report.columns().iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }
}

/// Validates a `YYYY-MM` month token.
fn parse_month(param: Option<&str>) -> StoreResult<String> {
    let token = param.map(str::trim).unwrap_or_default();
    let well_formed = token.len() == 7
        && token.as_bytes()[4] == b'-'
        && NaiveDate::parse_from_str(&format!("{}-01", token), "%Y-%m-%d").is_ok();

    if !well_formed {
        return Err(StoreError::validation(format!(
            "expected a month as YYYY-MM, got {:?}",
            token
        )));
    }
    Ok(token.to_string())
}

fn decode_row(row: &SqliteRow) -> StoreResult<Vec<ReportValue>> {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

fn decode_cell(row: &SqliteRow, index: usize) -> StoreResult<ReportValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(ReportValue::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => ReportValue::Integer(row.try_get(index)?),
        "REAL" | "NUMERIC" => ReportValue::Real(row.try_get(index)?),
        _ => ReportValue::Text(row.try_get(index)?),
    };
    Ok(value)
}
