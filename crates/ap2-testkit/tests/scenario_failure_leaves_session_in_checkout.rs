//! Failure handling through the session.
//!
//! GREEN when, for each failing step:
//! - The session stays on `checkout` with its product still selected.
//! - The audit log ends with exactly one STEP_FAILED naming that step and
//!   holds no record of any later step.
//! - No mandate or payment result is stored.
//! A declined payment additionally keeps its PAYMENT_EXECUTED(FAILED) record.

use ap2_audit::{AuditRecord, WorkflowStep};
use ap2_mandate::{AmountBandScorer, MandateWorkflow, PaperRail, PaperRegistry};
use ap2_schemas::{PaymentStatus, RiskScore, ShopperProfile};
use ap2_session::{OrderSession, Page, SessionError};
use ap2_testkit::{
    fixture_catalog, session_at_checkout, DecliningRail, FixedScorer, RejectingRegistry,
    TransportFailRail,
};

const MERCHANT: &str = "merchant:amazon-uae";

fn assert_failed_at(s: &OrderSession, step: WorkflowStep, kind: &str) {
    assert_eq!(s.page(), Page::Checkout);
    assert!(s.current_product().is_some());
    assert!(s.mandate().is_none());
    assert!(s.payment_result().is_none());

    let failures: Vec<_> = s.audit_log().records().filter(|r| r.is_failure()).collect();
    assert_eq!(failures.len(), 1);
    match s.audit_log().last().unwrap() {
        AuditRecord::StepFailed {
            step: got,
            error_kind,
            ..
        } => {
            assert_eq!(*got, step);
            assert_eq!(error_kind, kind);
        }
        other => panic!("expected trailing STEP_FAILED, got {other:?}"),
    }
}

#[test]
fn registration_rejection() {
    let wf = MandateWorkflow::new(
        RejectingRegistry::default(),
        AmountBandScorer::new(1_000_000_000, 5_000_000_000),
        PaperRail::new("Aani"),
    );
    let mut s = session_at_checkout(&fixture_catalog(), "boots-low").unwrap();

    let err = s.confirm(&wf, &ShopperProfile::default(), MERCHANT).unwrap_err();

    assert!(matches!(err, SessionError::Workflow(_)));
    assert_failed_at(&s, WorkflowStep::Register, "REGISTRATION_ERROR");
    assert_eq!(s.audit_log().events(), vec!["MANDATE_ISSUED", "STEP_FAILED"]);
    assert_eq!(wf.rail().settled_count(), 0);
}

#[test]
fn high_risk_product_from_catalog() {
    let wf = MandateWorkflow::new(
        PaperRegistry::new("CBUAE"),
        AmountBandScorer::new(1_000_000_000, 5_000_000_000),
        DecliningRail::default(),
    );
    let mut s = session_at_checkout(&fixture_catalog(), "boots-high").unwrap();

    s.confirm(&wf, &ShopperProfile::default(), MERCHANT).unwrap_err();

    assert_failed_at(&s, WorkflowStep::RiskCheck, "RISK_REJECTED");
    assert_eq!(
        s.audit_log().events(),
        vec!["MANDATE_ISSUED", "REGISTERED", "RISK_CHECK", "STEP_FAILED"]
    );
    assert_eq!(wf.rail().calls(), 0, "rail must not be invoked");
}

#[test]
fn payment_transport_failure() {
    let wf = MandateWorkflow::new(
        PaperRegistry::new("CBUAE"),
        FixedScorer(RiskScore::Low),
        TransportFailRail::default(),
    );
    let mut s = session_at_checkout(&fixture_catalog(), "boots-low").unwrap();

    let err = s.confirm(&wf, &ShopperProfile::default(), MERCHANT).unwrap_err();

    match err {
        SessionError::Workflow(e) => {
            assert_eq!(e.kind(), "PAYMENT_TRANSPORT_ERROR");
            assert!(e.is_retryable());
        }
        other => panic!("expected workflow error, got {other:?}"),
    }
    assert_failed_at(&s, WorkflowStep::ExecutePayment, "PAYMENT_TRANSPORT_ERROR");
    assert_eq!(
        s.audit_log().events(),
        vec!["MANDATE_ISSUED", "REGISTERED", "RISK_CHECK", "STEP_FAILED"]
    );
    assert_eq!(wf.rail().calls(), 1);
}

#[test]
fn declined_payment_keeps_the_rail_response() {
    let wf = MandateWorkflow::new(
        PaperRegistry::new("CBUAE"),
        FixedScorer(RiskScore::Low),
        DecliningRail::default(),
    );
    let mut s = session_at_checkout(&fixture_catalog(), "boots-low").unwrap();

    let err = s.confirm(&wf, &ShopperProfile::default(), MERCHANT).unwrap_err();

    match err {
        SessionError::Workflow(e) => {
            assert_eq!(e.kind(), "PAYMENT_DECLINED");
            assert!(!e.is_retryable());
        }
        other => panic!("expected workflow error, got {other:?}"),
    }
    assert_failed_at(&s, WorkflowStep::ExecutePayment, "PAYMENT_DECLINED");
    assert_eq!(
        s.audit_log().events(),
        vec![
            "MANDATE_ISSUED",
            "REGISTERED",
            "RISK_CHECK",
            "PAYMENT_EXECUTED",
            "STEP_FAILED"
        ]
    );
    assert!(matches!(
        s.audit_log().entries()[3].record,
        AuditRecord::PaymentExecuted {
            status: PaymentStatus::Failed,
            ..
        }
    ));
}

#[test]
fn retry_from_checkout_after_failure_can_succeed() {
    let failing = MandateWorkflow::new(
        PaperRegistry::new("CBUAE"),
        FixedScorer(RiskScore::Low),
        TransportFailRail::default(),
    );
    let healthy = ap2_testkit::paper_workflow_default();
    let mut s = session_at_checkout(&fixture_catalog(), "boots-low").unwrap();

    s.confirm(&failing, &ShopperProfile::default(), MERCHANT).unwrap_err();
    s.confirm(&healthy, &ShopperProfile::default(), MERCHANT).unwrap();

    assert_eq!(s.page(), Page::Confirmation);
    assert_eq!(s.audit_log().len(), 8);
    assert_eq!(s.audit_log().last().unwrap().event(), "PAYMENT_EXECUTED");
}
