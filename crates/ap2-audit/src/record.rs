use ap2_schemas::{PaymentResult, PaymentStatus, RiskScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Workflow steps that can abort a run, in execution order.
///
/// Conversion to the payment phase cannot fail, so it has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    IssueMandate,
    Register,
    RiskCheck,
    ExecutePayment,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::IssueMandate => "ISSUE_MANDATE",
            WorkflowStep::Register => "REGISTER",
            WorkflowStep::RiskCheck => "RISK_CHECK",
            WorkflowStep::ExecutePayment => "EXECUTE_PAYMENT",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable, timestamped fact about a workflow step.
///
/// `timestamp` is assigned by the constructors at record creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditRecord {
    MandateIssued {
        mandate_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    Registered {
        mandate_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    RiskCheck {
        mandate_id: Uuid,
        risk_score: RiskScore,
        timestamp: DateTime<Utc>,
    },
    PaymentExecuted {
        mandate_id: Uuid,
        transaction_id: String,
        status: PaymentStatus,
        rail: String,
        timestamp: DateTime<Utc>,
        response: Value,
    },
    /// A step aborted the workflow. `mandate_id` is absent when validation
    /// failed before any mandate existed.
    StepFailed {
        mandate_id: Option<Uuid>,
        step: WorkflowStep,
        error_kind: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl AuditRecord {
    pub fn mandate_issued(mandate_id: Uuid) -> Self {
        AuditRecord::MandateIssued {
            mandate_id,
            timestamp: Utc::now(),
        }
    }

    pub fn registered(mandate_id: Uuid) -> Self {
        AuditRecord::Registered {
            mandate_id,
            timestamp: Utc::now(),
        }
    }

    pub fn risk_check(mandate_id: Uuid, risk_score: RiskScore) -> Self {
        AuditRecord::RiskCheck {
            mandate_id,
            risk_score,
            timestamp: Utc::now(),
        }
    }

    pub fn payment_executed(mandate_id: Uuid, result: &PaymentResult) -> Self {
        AuditRecord::PaymentExecuted {
            mandate_id,
            transaction_id: result.transaction_id.clone(),
            status: result.status,
            rail: result.rail.clone(),
            timestamp: Utc::now(),
            response: result.to_payload(),
        }
    }

    pub fn step_failed(
        mandate_id: Option<Uuid>,
        step: WorkflowStep,
        error_kind: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AuditRecord::StepFailed {
            mandate_id,
            step,
            error_kind: error_kind.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// Wire name of the event kind, e.g. `RISK_CHECK`.
    pub fn event(&self) -> &'static str {
        match self {
            AuditRecord::MandateIssued { .. } => "MANDATE_ISSUED",
            AuditRecord::Registered { .. } => "REGISTERED",
            AuditRecord::RiskCheck { .. } => "RISK_CHECK",
            AuditRecord::PaymentExecuted { .. } => "PAYMENT_EXECUTED",
            AuditRecord::StepFailed { .. } => "STEP_FAILED",
        }
    }

    pub fn mandate_id(&self) -> Option<Uuid> {
        match self {
            AuditRecord::MandateIssued { mandate_id, .. }
            | AuditRecord::Registered { mandate_id, .. }
            | AuditRecord::RiskCheck { mandate_id, .. }
            | AuditRecord::PaymentExecuted { mandate_id, .. } => Some(*mandate_id),
            AuditRecord::StepFailed { mandate_id, .. } => *mandate_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AuditRecord::MandateIssued { timestamp, .. }
            | AuditRecord::Registered { timestamp, .. }
            | AuditRecord::RiskCheck { timestamp, .. }
            | AuditRecord::PaymentExecuted { timestamp, .. }
            | AuditRecord::StepFailed { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AuditRecord::StepFailed { .. })
    }
}
