//! Registration retry policy.
//!
//! GREEN when:
//! - An unreachable registry is retried up to the attempt limit and a late
//!   success yields exactly one REGISTERED record.
//! - Exhausting the attempts aborts with REGISTRATION_ERROR before any risk
//!   check or payment.
//! - A definitive rejection is not retried.

use ap2_audit::{AuditLog, AuditRecord, WorkflowStep};
use ap2_mandate::{AmountBandScorer, MandateWorkflow, PaperRail, RegistrationError, WorkflowError};
use ap2_testkit::{reference_params, FlakyRegistry, RejectingRegistry};

fn scorer() -> AmountBandScorer {
    AmountBandScorer::new(1_000_000_000, 5_000_000_000)
}

#[test]
fn late_success_within_attempts_completes_the_run() {
    let wf = MandateWorkflow::new(FlakyRegistry::new(2), scorer(), PaperRail::new("Aani"))
        .with_registration_attempts(3);
    let mut log = AuditLog::default();

    wf.run(reference_params(), &mut log).unwrap();

    assert_eq!(wf.registry().calls(), 3);
    assert_eq!(
        log.events(),
        vec!["MANDATE_ISSUED", "REGISTERED", "RISK_CHECK", "PAYMENT_EXECUTED"]
    );
}

#[test]
fn exhausted_attempts_abort_before_risk_check() {
    let wf = MandateWorkflow::new(FlakyRegistry::new(5), scorer(), PaperRail::new("Aani"))
        .with_registration_attempts(3);
    let mut log = AuditLog::default();

    let err = wf.run(reference_params(), &mut log).unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Registration(RegistrationError::Unreachable { .. })
    ));
    assert!(err.is_retryable());
    assert_eq!(wf.registry().calls(), 3);
    assert_eq!(wf.rail().settled_count(), 0);
    assert_eq!(log.events(), vec!["MANDATE_ISSUED", "STEP_FAILED"]);
    match log.last().unwrap() {
        AuditRecord::StepFailed {
            mandate_id,
            step,
            error_kind,
            ..
        } => {
            assert_eq!(*mandate_id, log.entries()[0].record.mandate_id());
            assert_eq!(*step, WorkflowStep::Register);
            assert_eq!(error_kind, "REGISTRATION_ERROR");
        }
        other => panic!("expected STEP_FAILED, got {other:?}"),
    }
}

#[test]
fn rejection_is_not_retried() {
    let wf = MandateWorkflow::new(RejectingRegistry::default(), scorer(), PaperRail::new("Aani"))
        .with_registration_attempts(5);
    let mut log = AuditLog::default();

    let err = wf.run(reference_params(), &mut log).unwrap_err();

    assert!(!err.is_retryable());
    assert_eq!(wf.registry().calls(), 1);
    assert_eq!(log.events(), vec!["MANDATE_ISSUED", "STEP_FAILED"]);
}
