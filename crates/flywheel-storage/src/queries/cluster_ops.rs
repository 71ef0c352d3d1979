//! learning_issue_clusters: delete-then-bulk-insert replacement and reads.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{ClusterData, IssueCluster};
use flywheel_core::period::{PeriodGranularity, PeriodKey};

use crate::to_storage_err;

/// Replace all cluster rows for the recomputed periods.
///
/// The delete set is the union of the window's periods and the periods
/// present in `clusters`: a period whose events disappeared since the last
/// run yields no output rows but must still be cleared. Deleting by period
/// (not the whole table) leaves older periods intact for drift history.
pub fn replace_clusters(
    conn: &Connection,
    window_periods: &[PeriodKey],
    clusters: &[IssueCluster],
) -> FlywheelResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("replace_clusters begin: {e}")))?;

    let mut periods: BTreeSet<(&str, &str)> = window_periods
        .iter()
        .map(|p| (p.granularity.as_str(), p.key.as_str()))
        .collect();
    periods.extend(
        clusters
            .iter()
            .map(|c| (c.granularity.as_str(), c.period_key.as_str())),
    );
    for (granularity, period_key) in periods {
        tx.execute(
            "DELETE FROM learning_issue_clusters
             WHERE period_granularity = ?1 AND period_key = ?2",
            params![granularity, period_key],
        )
        .map_err(|e| to_storage_err(format!("replace_clusters delete: {e}")))?;
    }

    for cluster in clusters {
        let data = serde_json::to_string(&cluster.cluster_data)?;
        tx.execute(
            "INSERT INTO learning_issue_clusters (
                period_granularity, period_key, cluster_signature,
                score, event_count, unique_users, cluster_data, computed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                cluster.granularity.as_str(),
                cluster.period_key,
                cluster.cluster_signature,
                cluster.score,
                cluster.event_count as i64,
                cluster.unique_users as i64,
                data,
                cluster.computed_at.to_rfc3339(),
            ],
        )
        .map_err(|e| to_storage_err(format!("replace_clusters insert: {e}")))?;
    }

    tx.commit()
        .map_err(|e| to_storage_err(format!("replace_clusters commit: {e}")))
}

/// All clusters of the most recent weekly period, highest score first.
/// This is what BacklogBridge consumes.
pub fn latest_week_clusters(conn: &Connection) -> FlywheelResult<Vec<IssueCluster>> {
    let mut stmt = conn
        .prepare(
            "SELECT period_granularity, period_key, cluster_signature,
                    score, event_count, unique_users, cluster_data, computed_at
             FROM learning_issue_clusters
             WHERE period_granularity = 'week'
               AND period_key = (
                   SELECT MAX(period_key) FROM learning_issue_clusters
                   WHERE period_granularity = 'week'
               )
             ORDER BY score DESC, cluster_signature ASC",
        )
        .map_err(|e| to_storage_err(format!("latest_week_clusters prepare: {e}")))?;

    let rows = stmt
        .query_map([], row_to_cluster)
        .map_err(|e| to_storage_err(format!("latest_week_clusters query: {e}")))?;

    let mut clusters = Vec::new();
    for row in rows {
        clusters.push(row.map_err(|e| to_storage_err(format!("latest_week_clusters row: {e}")))?);
    }
    Ok(clusters)
}

fn row_to_cluster(row: &rusqlite::Row<'_>) -> rusqlite::Result<IssueCluster> {
    let granularity: String = row.get(0)?;
    let data: String = row.get(6)?;
    let computed_at: String = row.get(7)?;
    Ok(IssueCluster {
        granularity: PeriodGranularity::parse(&granularity).unwrap_or(PeriodGranularity::Week),
        period_key: row.get(1)?,
        cluster_signature: row.get(2)?,
        score: row.get(3)?,
        event_count: row.get::<_, i64>(4)? as usize,
        unique_users: row.get::<_, i64>(5)? as usize,
        cluster_data: serde_json::from_str::<ClusterData>(&data).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        computed_at: computed_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
