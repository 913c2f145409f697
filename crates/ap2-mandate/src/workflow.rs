//! The five-step mandate workflow.
//!
//! ```text
//! issue ──► register ──► convert ──► risk check ──► execute payment
//!  MANDATE_    REGISTERED    (none)     RISK_CHECK      PAYMENT_EXECUTED
//!  ISSUED
//! ```
//!
//! Each step method appends its own success record and, on failure, a single
//! `STEP_FAILED` record before returning the error. [`MandateWorkflow::run`]
//! chains the steps and stops at the first error, so no later-step record
//! ever follows a failure.
//!
//! Cancellation is polled between steps only. Once payment submission has
//! started it runs to completion.

use ap2_audit::{AuditLog, AuditRecord, WorkflowStep};
use ap2_schemas::{PaymentResult, RiskScore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    IntentMandate, Mandate, MandateParams, MandateRegistry, PaymentMandate, PaymentRail,
    RegistrationReceipt, RiskClearance, RiskPolicy, RiskScorer, ValidationError, WorkflowError,
};

/// Default number of registration attempts when the registry is unreachable.
pub const DEFAULT_REGISTRATION_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Phase transitions
// ---------------------------------------------------------------------------

/// Validate `params` and issue a mandate with a fresh id.
pub fn issue_intent_mandate(params: MandateParams) -> Result<IntentMandate, ValidationError> {
    params.validate()?;
    Ok(IntentMandate(Mandate::issue(params)))
}

/// Move a mandate into its payment phase. Fields and id are unchanged.
pub fn convert_to_payment(intent: IntentMandate) -> PaymentMandate {
    PaymentMandate(intent.0)
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Polled by the workflow between steps.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool> CancelSignal for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    pub mandate: PaymentMandate,
    pub receipt: RegistrationReceipt,
    pub risk_score: RiskScore,
    pub payment: PaymentResult,
}

/// Runs the workflow against a registry `R`, scorer `S` and rail `P`.
#[derive(Debug)]
pub struct MandateWorkflow<R, S, P> {
    registry: R,
    scorer: S,
    rail: P,
    policy: RiskPolicy,
    registration_attempts: u32,
}

impl<R, S, P> MandateWorkflow<R, S, P>
where
    R: MandateRegistry,
    S: RiskScorer,
    P: PaymentRail,
{
    pub fn new(registry: R, scorer: S, rail: P) -> Self {
        Self {
            registry,
            scorer,
            rail,
            policy: RiskPolicy::default(),
            registration_attempts: DEFAULT_REGISTRATION_ATTEMPTS,
        }
    }

    pub fn with_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Values below 1 are treated as 1.
    pub fn with_registration_attempts(mut self, attempts: u32) -> Self {
        self.registration_attempts = attempts.max(1);
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn rail(&self) -> &P {
        &self.rail
    }

    pub fn policy(&self) -> RiskPolicy {
        self.policy
    }

    pub fn registration_attempts(&self) -> u32 {
        self.registration_attempts
    }

    /// Run all five steps. Equivalent to `run_with_cancel(.., &NeverCancel)`.
    pub fn run(
        &self,
        params: MandateParams,
        audit: &mut AuditLog,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.run_with_cancel(params, audit, &NeverCancel)
    }

    pub fn run_with_cancel(
        &self,
        params: MandateParams,
        audit: &mut AuditLog,
        cancel: &dyn CancelSignal,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let intent = self.issue(params, audit)?;
        let id = intent.id();

        checkpoint(cancel, audit, id, WorkflowStep::Register)?;
        let receipt = self.register(&intent, audit)?;

        let mandate = convert_to_payment(intent);

        checkpoint(cancel, audit, id, WorkflowStep::RiskCheck)?;
        let clearance = self.risk_check(&mandate, audit)?;

        checkpoint(cancel, audit, id, WorkflowStep::ExecutePayment)?;
        let payment = self.execute_payment(&mandate, &clearance, audit)?;

        Ok(WorkflowOutcome {
            mandate,
            receipt,
            risk_score: clearance.score(),
            payment,
        })
    }

    /// Step 1.
    pub fn issue(
        &self,
        params: MandateParams,
        audit: &mut AuditLog,
    ) -> Result<IntentMandate, WorkflowError> {
        let intent = match issue_intent_mandate(params) {
            Ok(m) => m,
            Err(e) => return Err(record_failure(audit, None, e.into())),
        };
        append(
            audit,
            WorkflowStep::IssueMandate,
            AuditRecord::mandate_issued(intent.id()),
        )?;
        info!(mandate_id = %intent.id(), amount = %intent.mandate().display_amount(), "workflow/issue");
        Ok(intent)
    }

    /// Step 2. Retries `Unreachable` up to the configured attempt count.
    pub fn register(
        &self,
        intent: &IntentMandate,
        audit: &mut AuditLog,
    ) -> Result<RegistrationReceipt, WorkflowError> {
        let id = intent.id();
        let mut attempt = 1;
        let receipt = loop {
            match self.registry.register(intent) {
                Ok(r) => break r,
                Err(e) if e.is_retryable() && attempt < self.registration_attempts => {
                    warn!(mandate_id = %id, attempt, error = %e, "workflow/register retry");
                    attempt += 1;
                }
                Err(e) => return Err(record_failure(audit, Some(id), e.into())),
            }
        };
        append(audit, WorkflowStep::Register, AuditRecord::registered(id))?;
        info!(mandate_id = %id, registry_ref = %receipt.registry_ref, attempt, "workflow/register");
        Ok(receipt)
    }

    /// Step 4. Appends the score before applying the policy, so a blocked
    /// mandate still shows its `RISK_CHECK` record.
    pub fn risk_check(
        &self,
        mandate: &PaymentMandate,
        audit: &mut AuditLog,
    ) -> Result<RiskClearance, WorkflowError> {
        let id = mandate.id();
        let score = self.scorer.score(mandate);
        append(
            audit,
            WorkflowStep::RiskCheck,
            AuditRecord::risk_check(id, score),
        )?;
        info!(mandate_id = %id, risk_score = %score, "workflow/risk_check");

        self.policy
            .clear(mandate, score)
            .map_err(|e| record_failure(audit, Some(id), e))
    }

    /// Step 5.
    pub fn execute_payment(
        &self,
        mandate: &PaymentMandate,
        clearance: &RiskClearance,
        audit: &mut AuditLog,
    ) -> Result<PaymentResult, WorkflowError> {
        let id = mandate.id();
        if clearance.mandate_id() != id {
            let err = WorkflowError::ClearanceMismatch {
                mandate_id: id,
                cleared_id: clearance.mandate_id(),
            };
            return Err(record_failure(audit, Some(id), err));
        }

        let result = match self.rail.submit(mandate) {
            Ok(r) => r,
            Err(e) => return Err(record_failure(audit, Some(id), e.into())),
        };

        append(
            audit,
            WorkflowStep::ExecutePayment,
            AuditRecord::payment_executed(id, &result),
        )?;

        if !result.status.is_success() {
            let err = WorkflowError::PaymentDeclined {
                transaction_id: result.transaction_id.clone(),
                status: result.status,
                rail: result.rail.clone(),
            };
            return Err(record_failure(audit, Some(id), err));
        }

        info!(
            mandate_id = %id,
            transaction_id = %result.transaction_id,
            rail = %result.rail,
            "workflow/execute_payment"
        );
        Ok(result)
    }
}

fn checkpoint(
    cancel: &dyn CancelSignal,
    audit: &mut AuditLog,
    mandate_id: Uuid,
    next: WorkflowStep,
) -> Result<(), WorkflowError> {
    if cancel.is_cancelled() {
        return Err(record_failure(
            audit,
            Some(mandate_id),
            WorkflowError::Cancelled { before: next },
        ));
    }
    Ok(())
}

fn append(audit: &mut AuditLog, step: WorkflowStep, record: AuditRecord) -> Result<(), WorkflowError> {
    audit
        .append(record)
        .map(|_| ())
        .map_err(|e| WorkflowError::Audit {
            step,
            reason: format!("{e:#}"),
        })
}

/// Append `STEP_FAILED` for `err` and hand the error back.
///
/// If the failure record itself cannot be appended, the audit error replaces
/// the original one.
fn record_failure(audit: &mut AuditLog, mandate_id: Option<Uuid>, err: WorkflowError) -> WorkflowError {
    let step = err.step();
    warn!(mandate_id = ?mandate_id, step = %step, error = %err, "workflow/step_failed");
    let record = AuditRecord::step_failed(mandate_id, step, err.kind(), err.to_string());
    match append(audit, step, record) {
        Ok(()) => err,
        Err(audit_err) => audit_err,
    }
}
