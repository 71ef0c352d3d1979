//! Promotion checklist assembly.

use flywheel_core::models::{
    ChecklistStep, PromotionChecklist, StepKind, StepState, CHECKLIST_STEP_IDS,
};

/// Evidence a builder actually placed on the candidate. Auto steps complete
/// only when their evidence is present; manual steps are always pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoEvidence {
    pub has_root_cause_hypothesis: bool,
    pub has_invariant_mapping: bool,
}

pub fn build_checklist(evidence: AutoEvidence) -> PromotionChecklist {
    let steps = CHECKLIST_STEP_IDS
        .iter()
        .map(|(id, kind)| {
            let state = match (*kind, *id) {
                // A freshly built candidate is always awaiting its decision;
                // the gate completes only once a human records one.
                (StepKind::Auto, "human_approval_gate") => StepState::Pending,
                (StepKind::Auto, "root_cause_hypothesis_attached") => {
                    if evidence.has_root_cause_hypothesis {
                        StepState::Completed
                    } else {
                        StepState::Pending
                    }
                }
                (StepKind::Auto, "invariant_policy_mapping") => {
                    if evidence.has_invariant_mapping {
                        StepState::Completed
                    } else {
                        StepState::Pending
                    }
                }
                _ => StepState::Pending,
            };
            ChecklistStep {
                id: (*id).to_string(),
                kind: *kind,
                state,
            }
        })
        .collect();
    PromotionChecklist { steps }
}
