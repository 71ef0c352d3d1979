//! Domain entities owned by the pipeline, plus the event-store input shapes.

pub mod calibration;
pub mod candidate;
pub mod cluster;
pub mod events;
pub mod proposal;
pub mod run;
pub mod sample;

pub use calibration::{CalibrationMetric, CalibrationStatus, DriftStatus};
pub use candidate::{
    CandidateStatus, ChecklistStep, LearningBacklogCandidate, PromotionChecklist, SourceType,
    StepKind, StepState, CHECKLIST_STEP_IDS,
};
pub use cluster::{ClusterData, ClusterExample, FalsePositiveControls, IssueCluster, ScoreFactors};
pub use events::EventRow;
pub use proposal::{
    EvidenceBundle, NumericRange, ObservationExample, ProposalStatus, RiskNote, ScopeLevel,
    SuggestedDimension, UnknownDimensionProposal, ValueType,
};
pub use run::{NightlyRunReport, PhaseOutcome, PhaseStatus, PipelinePhase};
pub use sample::{ConfidenceBand, LearningSignalSample, RejectReason, SignalCategory};
