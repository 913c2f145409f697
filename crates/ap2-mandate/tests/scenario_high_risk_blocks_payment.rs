//! Risk gate.
//!
//! GREEN when:
//! - A mandate scored at or above `block_at` never reaches the rail.
//! - The log ends RISK_CHECK then STEP_FAILED(RISK_REJECTED); no
//!   PAYMENT_EXECUTED is ever written.
//! - Lowering `block_at` via config blocks MEDIUM too.

use ap2_audit::{AuditLog, AuditRecord, WorkflowStep};
use ap2_config::{load_layered_yaml_from_strings, DemoConfig};
use ap2_mandate::{paper_workflow, MandateParams, WorkflowError};
use ap2_schemas::RiskScore;

fn params(amount_micros: i64) -> MandateParams {
    MandateParams {
        user: "Aamir".to_string(),
        merchant: "merchant:amazon-uae".to_string(),
        amount_micros,
        currency: "AED".to_string(),
        description: "Order Expedition Kit".to_string(),
    }
}

#[test]
fn high_risk_never_reaches_the_rail() {
    let wf = paper_workflow(&DemoConfig::default()).unwrap();
    let mut log = AuditLog::default();

    let err = wf.run(params(7_500_000_000), &mut log).unwrap_err();

    assert_eq!(
        err,
        WorkflowError::RiskRejected {
            score: RiskScore::High,
            block_at: RiskScore::High
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(wf.rail().settled_count(), 0);
    assert_eq!(
        log.events(),
        vec!["MANDATE_ISSUED", "REGISTERED", "RISK_CHECK", "STEP_FAILED"]
    );
    match log.last().unwrap() {
        AuditRecord::StepFailed {
            step, error_kind, ..
        } => {
            assert_eq!(*step, WorkflowStep::RiskCheck);
            assert_eq!(error_kind, "RISK_REJECTED");
        }
        other => panic!("expected STEP_FAILED, got {other:?}"),
    }
}

#[test]
fn medium_passes_by_default_but_not_under_strict_policy() {
    let wf = paper_workflow(&DemoConfig::default()).unwrap();
    let mut log = AuditLog::default();
    let out = wf.run(params(2_000_000_000), &mut log).unwrap();
    assert_eq!(out.risk_score, RiskScore::Medium);

    let loaded = load_layered_yaml_from_strings(&["risk:\n  block_at: MEDIUM\n"]).unwrap();
    let strict = paper_workflow(&DemoConfig::from_loaded(&loaded).unwrap()).unwrap();
    let mut log = AuditLog::default();
    let err = strict.run(params(2_000_000_000), &mut log).unwrap_err();
    assert_eq!(err.kind(), "RISK_REJECTED");
    assert_eq!(strict.rail().settled_count(), 0);
}
