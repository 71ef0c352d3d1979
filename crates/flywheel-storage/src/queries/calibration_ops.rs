//! extraction_calibration_metrics and the underperforming mirror table.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{CalibrationMetric, CalibrationStatus, DriftStatus};
use flywheel_core::period::{PeriodGranularity, PeriodKey};

use crate::to_storage_err;

/// Replace metric rows for the recomputed periods, and refresh the
/// `extraction_underperforming_classes` mirror (non-healthy rows only) for
/// those same periods, all in one transaction.
///
/// The delete set is the union of the window's periods and the periods
/// present in `metrics`, so a period whose claims vanished between runs is
/// still cleared.
pub fn replace_metrics(
    conn: &Connection,
    window_periods: &[PeriodKey],
    metrics: &[CalibrationMetric],
) -> FlywheelResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("replace_metrics begin: {e}")))?;

    let mut periods: BTreeSet<(&str, &str)> = window_periods
        .iter()
        .map(|p| (p.granularity.as_str(), p.key.as_str()))
        .collect();
    periods.extend(
        metrics
            .iter()
            .map(|m| (m.granularity.as_str(), m.period_key.as_str())),
    );
    for (granularity, period_key) in &periods {
        for table in [
            "extraction_calibration_metrics",
            "extraction_underperforming_classes",
        ] {
            tx.execute(
                &format!(
                    "DELETE FROM {table}
                     WHERE period_granularity = ?1 AND period_key = ?2"
                ),
                params![granularity, period_key],
            )
            .map_err(|e| to_storage_err(format!("replace_metrics delete {table}: {e}")))?;
        }
    }

    for metric in metrics {
        tx.execute(
            "INSERT INTO extraction_calibration_metrics (
                period_granularity, period_key, claim_class, parser_version,
                sample_count, correct_count, incorrect_count, brier_score,
                precision_high_conf, recall_high_conf, status, drift_status,
                drift_delta_brier, computed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                metric.granularity.as_str(),
                metric.period_key,
                metric.claim_class,
                metric.parser_version,
                metric.sample_count as i64,
                metric.correct_count as i64,
                metric.incorrect_count as i64,
                metric.brier_score,
                metric.precision_high_conf,
                metric.recall_high_conf,
                metric.status.as_str(),
                metric.drift_status.as_str(),
                metric.drift_delta_brier,
                metric.computed_at.to_rfc3339(),
            ],
        )
        .map_err(|e| to_storage_err(format!("replace_metrics insert: {e}")))?;

        if metric.status != CalibrationStatus::Healthy {
            tx.execute(
                "INSERT INTO extraction_underperforming_classes (
                    period_granularity, period_key, claim_class, parser_version,
                    status, brier_score, precision_high_conf, sample_count, computed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    metric.granularity.as_str(),
                    metric.period_key,
                    metric.claim_class,
                    metric.parser_version,
                    metric.status.as_str(),
                    metric.brier_score,
                    metric.precision_high_conf,
                    metric.sample_count as i64,
                    metric.computed_at.to_rfc3339(),
                ],
            )
            .map_err(|e| to_storage_err(format!("replace_metrics mirror insert: {e}")))?;
        }
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("replace_metrics commit: {e}")))
}

/// Fetch one stored metric, used for drift lookups against periods that
/// precede the current window.
pub fn get_metric(
    conn: &Connection,
    granularity: PeriodGranularity,
    period_key: &str,
    claim_class: &str,
    parser_version: &str,
) -> FlywheelResult<Option<CalibrationMetric>> {
    conn.query_row(
        "SELECT period_granularity, period_key, claim_class, parser_version,
                sample_count, correct_count, incorrect_count, brier_score,
                precision_high_conf, recall_high_conf, status, drift_status,
                drift_delta_brier, computed_at
         FROM extraction_calibration_metrics
         WHERE period_granularity = ?1 AND period_key = ?2
           AND claim_class = ?3 AND parser_version = ?4",
        params![granularity.as_str(), period_key, claim_class, parser_version],
        row_to_metric,
    )
    .optional()
    .map_err(|e| to_storage_err(format!("get_metric: {e}")))
}

/// Non-healthy weekly rows of the most recent weekly period, the
/// BacklogBridge input.
pub fn latest_week_underperforming(conn: &Connection) -> FlywheelResult<Vec<CalibrationMetric>> {
    let mut stmt = conn
        .prepare(
            "SELECT period_granularity, period_key, claim_class, parser_version,
                    sample_count, correct_count, incorrect_count, brier_score,
                    precision_high_conf, recall_high_conf, status, drift_status,
                    drift_delta_brier, computed_at
             FROM extraction_calibration_metrics
             WHERE period_granularity = 'week'
               AND status != 'healthy'
               AND period_key = (
                   SELECT MAX(period_key) FROM extraction_calibration_metrics
                   WHERE period_granularity = 'week'
               )
             ORDER BY brier_score DESC, claim_class ASC, parser_version ASC",
        )
        .map_err(|e| to_storage_err(format!("latest_week_underperforming prepare: {e}")))?;

    let rows = stmt
        .query_map([], row_to_metric)
        .map_err(|e| to_storage_err(format!("latest_week_underperforming query: {e}")))?;

    let mut metrics = Vec::new();
    for row in rows {
        metrics.push(row.map_err(|e| to_storage_err(format!("underperforming row: {e}")))?);
    }
    Ok(metrics)
}

fn row_to_metric(row: &rusqlite::Row<'_>) -> rusqlite::Result<CalibrationMetric> {
    let granularity: String = row.get(0)?;
    let status: String = row.get(10)?;
    let drift_status: String = row.get(11)?;
    let computed_at: String = row.get(13)?;
    Ok(CalibrationMetric {
        granularity: PeriodGranularity::parse(&granularity).unwrap_or(PeriodGranularity::Week),
        period_key: row.get(1)?,
        claim_class: row.get(2)?,
        parser_version: row.get(3)?,
        sample_count: row.get::<_, i64>(4)? as usize,
        correct_count: row.get::<_, i64>(5)? as usize,
        incorrect_count: row.get::<_, i64>(6)? as usize,
        brier_score: row.get(7)?,
        precision_high_conf: row.get(8)?,
        recall_high_conf: row.get(9)?,
        status: CalibrationStatus::parse(&status).unwrap_or(CalibrationStatus::Monitor),
        drift_status: DriftStatus::parse(&drift_status).unwrap_or(DriftStatus::InsufficientHistory),
        drift_delta_brier: row.get(12)?,
        computed_at: computed_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
