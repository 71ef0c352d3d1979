//! Phase sequencing, failure isolation, and audit recording.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use flywheel_core::config::Settings;
use flywheel_core::constants::VERSION;
use flywheel_core::errors::FlywheelResult;
use flywheel_core::models::{NightlyRunReport, PhaseOutcome, PhaseStatus, PipelinePhase};
use flywheel_storage::queries::run_log;
use flywheel_storage::StorageEngine;

use crate::phases::{self, PhaseRun, SourceAvailability};

/// One nightly invocation. Phases run in a fixed order; a phase failure is
/// logged and recorded but never aborts the remaining phases. Only a storage
/// failure while writing the audit row itself propagates, since a run that
/// cannot be audited must not report success.
pub fn run_nightly(engine: &StorageEngine, settings: &Settings) -> FlywheelResult<NightlyRunReport> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let since = started_at - Duration::days(settings.window.window_days);
    info!(
        run_id = %run_id,
        version = VERSION,
        window_days = settings.window.window_days,
        "nightly pipeline run starting"
    );

    let mut phases_out = Vec::with_capacity(4);
    let mut sources = SourceAvailability {
        clustering: false,
        calibration: false,
        dimensions: false,
    };

    let outcome = record(engine, &run_id, PipelinePhase::Clustering, || {
        phases::clustering(engine, settings, since, started_at)
    })?;
    sources.clustering = outcome.status == PhaseStatus::Success;
    phases_out.push(outcome);

    let outcome = record(engine, &run_id, PipelinePhase::Calibration, || {
        phases::calibration(engine, settings, since, started_at)
    })?;
    sources.calibration = outcome.status == PhaseStatus::Success;
    phases_out.push(outcome);

    let outcome = record(engine, &run_id, PipelinePhase::Dimensions, || {
        phases::dimensions(engine, settings, since, started_at)
    })?;
    sources.dimensions = outcome.status == PhaseStatus::Success;
    phases_out.push(outcome);

    let outcome = record(engine, &run_id, PipelinePhase::Backlog, || {
        phases::backlog(engine, settings, sources, started_at)
    })?;
    phases_out.push(outcome);

    let finished_at = Utc::now();
    info!(run_id = %run_id, "nightly pipeline run finished");
    Ok(NightlyRunReport {
        run_id,
        started_at,
        finished_at,
        phases: phases_out,
    })
}

/// Run one phase body, translate its result into a [`PhaseOutcome`], and
/// append the audit row. The audit row is written for every status.
fn record<F>(
    engine: &StorageEngine,
    run_id: &str,
    phase: PipelinePhase,
    body: F,
) -> FlywheelResult<PhaseOutcome>
where
    F: FnOnce() -> FlywheelResult<PhaseRun>,
{
    let started_at = Utc::now();
    let outcome = match body() {
        Ok(PhaseRun::Completed(details)) => PhaseOutcome {
            phase,
            status: PhaseStatus::Success,
            details,
        },
        Ok(PhaseRun::Skipped(missing_table)) => {
            info!(
                phase = phase.as_str(),
                missing_table, "target table missing, phase skipped"
            );
            PhaseOutcome {
                phase,
                status: PhaseStatus::Skipped,
                details: json!({ "missing_table": missing_table }),
            }
        }
        Err(e) => {
            warn!(phase = phase.as_str(), error = %e, "phase failed, continuing");
            PhaseOutcome {
                phase,
                status: PhaseStatus::Failed,
                details: json!({ "error": e.to_string() }),
            }
        }
    };
    let finished_at = Utc::now();
    engine.with_conn(|conn| {
        run_log::record_phase(conn, run_id, &outcome, started_at, finished_at)
    })?;
    Ok(outcome)
}
