//! The four phase bodies. Each makes one bulk read, computes in memory,
//! and writes in short transactions; the runner handles isolation and audit.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use flywheel_backlog::build_candidates;
use flywheel_calibration::{apply_drift, bucket_metrics, build_labeled_claims};
use flywheel_clustering::build_clusters;
use flywheel_core::config::Settings;
use flywheel_core::constants::{
    EVENT_CLAIM_LOGGED, EVENT_OBSERVATION_LOGGED, EVENT_RETRACTED, EVENT_SET_CORRECTED,
    EVENT_SIGNAL_LOGGED,
};
use flywheel_core::errors::FlywheelResult;
use flywheel_core::period::{PeriodGranularity, PeriodKey};
use flywheel_core::traits::EventSource;
use flywheel_dimensions::{mine_proposals, KnownDimensions};
use flywheel_storage::engine::table_exists;
use flywheel_storage::queries::{
    backlog_ops, calibration_ops, cluster_ops, proposal_ops, registry_ops,
};
use flywheel_storage::StorageEngine;

/// What one phase body did: a details blob for the audit row, or the name
/// of the missing table it degraded on.
pub enum PhaseRun {
    Completed(serde_json::Value),
    Skipped(&'static str),
}

/// Which producer phases completed this run. The bridge treats a failed
/// producer as contributing nothing rather than reading its stale rows.
#[derive(Debug, Clone, Copy)]
pub struct SourceAvailability {
    pub clustering: bool,
    pub calibration: bool,
    pub dimensions: bool,
}

fn events_table_present(engine: &StorageEngine) -> FlywheelResult<bool> {
    engine.with_conn(|conn| table_exists(conn, "events"))
}

/// All day and week periods the window touches, so the replacement deletes
/// cover periods that produced no output this run.
fn window_periods(since: DateTime<Utc>, now: DateTime<Utc>) -> Vec<PeriodKey> {
    let mut periods = PeriodKey::covering(PeriodGranularity::Day, since, now);
    periods.extend(PeriodKey::covering(PeriodGranularity::Week, since, now));
    periods
}

pub fn clustering(
    engine: &StorageEngine,
    settings: &Settings,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> FlywheelResult<PhaseRun> {
    if !events_table_present(engine)? {
        return Ok(PhaseRun::Skipped("events"));
    }
    let rows = engine.events_by_type(EVENT_SIGNAL_LOGGED, since)?;
    let outcome = build_clusters(&rows, &settings.clustering, now);
    let periods = window_periods(since, now);
    engine.with_conn(|conn| cluster_ops::replace_clusters(conn, &periods, &outcome.clusters))?;
    info!(
        clusters = outcome.clusters.len(),
        events = rows.len(),
        "clustering phase complete"
    );
    Ok(PhaseRun::Completed(json!({
        "clusters_written": outcome.clusters.len(),
        "telemetry": outcome.telemetry,
    })))
}

pub fn calibration(
    engine: &StorageEngine,
    settings: &Settings,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> FlywheelResult<PhaseRun> {
    if !events_table_present(engine)? {
        return Ok(PhaseRun::Skipped("events"));
    }
    let claims = engine.events_by_type(EVENT_CLAIM_LOGGED, since)?;
    let retractions = engine.events_by_type(EVENT_RETRACTED, since)?;
    let corrections = engine.events_by_type(EVENT_SET_CORRECTED, since)?;

    let (labeled, telemetry) = build_labeled_claims(&claims, &retractions, &corrections);
    let mut metrics = bucket_metrics(&labeled, &settings.calibration, now);
    apply_drift(
        &mut metrics,
        settings.calibration.drift_alert_delta_brier,
        |granularity, period_key, claim_class, parser_version| {
            engine.with_conn(|conn| {
                Ok(calibration_ops::get_metric(
                    conn,
                    granularity,
                    period_key,
                    claim_class,
                    parser_version,
                )?
                .map(|m| m.brier_score))
            })
        },
    )?;
    let periods = window_periods(since, now);
    engine.with_conn(|conn| calibration_ops::replace_metrics(conn, &periods, &metrics))?;
    info!(
        metrics = metrics.len(),
        claims = claims.len(),
        "calibration phase complete"
    );
    Ok(PhaseRun::Completed(json!({
        "metrics_written": metrics.len(),
        "telemetry": telemetry,
    })))
}

pub fn dimensions(
    engine: &StorageEngine,
    settings: &Settings,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> FlywheelResult<PhaseRun> {
    if !events_table_present(engine)? {
        return Ok(PhaseRun::Skipped("events"));
    }
    let registered = engine.with_conn(registry_ops::registered_dimensions)?;
    let known = KnownDimensions::with_registered(&registered);
    let rows = engine.events_by_type(EVENT_OBSERVATION_LOGGED, since)?;
    let outcome = mine_proposals(&rows, &known, &settings.dimensions, now);

    let mut written = 0usize;
    let mut guard_preserved = 0usize;
    engine.with_conn(|conn| {
        for proposal in &outcome.proposals {
            if proposal_ops::upsert_proposal(conn, proposal)? {
                written += 1;
            } else {
                guard_preserved += 1;
            }
        }
        Ok(())
    })?;
    info!(
        proposals = outcome.proposals.len(),
        written,
        guard_preserved,
        "dimensions phase complete"
    );
    Ok(PhaseRun::Completed(json!({
        "proposals_written": written,
        "guard_preserved": guard_preserved,
        "telemetry": outcome.telemetry,
    })))
}

pub fn backlog(
    engine: &StorageEngine,
    settings: &Settings,
    sources: SourceAvailability,
    now: DateTime<Utc>,
) -> FlywheelResult<PhaseRun> {
    let clusters = if sources.clustering {
        engine.with_conn(cluster_ops::latest_week_clusters)?
    } else {
        Vec::new()
    };
    let metrics = if sources.calibration {
        engine.with_conn(calibration_ops::latest_week_underperforming)?
    } else {
        Vec::new()
    };
    let proposals = if sources.dimensions {
        engine.with_conn(proposal_ops::accepted_proposals)?
    } else {
        Vec::new()
    };

    let outcome = build_candidates(&clusters, &metrics, &proposals, &settings.backlog, now);

    let mut written = 0usize;
    let mut guard_preserved = 0usize;
    engine.with_conn(|conn| {
        for candidate in &outcome.candidates {
            if backlog_ops::upsert_candidate(conn, candidate)? {
                written += 1;
            } else {
                guard_preserved += 1;
            }
        }
        Ok(())
    })?;
    info!(
        candidates = outcome.candidates.len(),
        written,
        guard_preserved,
        "backlog phase complete"
    );
    Ok(PhaseRun::Completed(json!({
        "candidates_written": written,
        "guard_preserved": guard_preserved,
        "telemetry": outcome.telemetry,
    })))
}
