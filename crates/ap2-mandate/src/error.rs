//! Failure taxonomy for the mandate workflow.
//!
//! Every [`WorkflowError`] names the step it aborted and a stable upper-snake
//! code, which is what lands in the `STEP_FAILED` audit record.

use ap2_audit::WorkflowStep;
use ap2_schemas::{PaymentStatus, PricingError, RiskScore};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Malformed order parameters, detected before a mandate is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NonPositiveAmount { amount_micros: i64 },
    MissingCurrency,
    MissingUser,
    MissingMerchant,
    UnrepresentableAmount(PricingError),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonPositiveAmount { amount_micros } => {
                write!(f, "amount must be positive (got {amount_micros} micros)")
            }
            ValidationError::MissingCurrency => write!(f, "currency is missing"),
            ValidationError::MissingUser => write!(f, "user is missing"),
            ValidationError::MissingMerchant => write!(f, "merchant is missing"),
            ValidationError::UnrepresentableAmount(e) => write!(f, "amount unusable: {e}"),
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// RegistrationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Registry could not be reached. Safe to retry: registration is
    /// idempotent on mandate id.
    Unreachable { reason: String },
    /// Registry answered and refused the mandate. Definitive.
    Rejected { reason: String },
}

impl RegistrationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::Unreachable { .. })
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Unreachable { reason } => write!(f, "registry unreachable: {reason}"),
            RegistrationError::Rejected { reason } => write!(f, "registry rejected mandate: {reason}"),
        }
    }
}

impl std::error::Error for RegistrationError {}

// ---------------------------------------------------------------------------
// RailError
// ---------------------------------------------------------------------------

/// Transport-level failure talking to a payment rail.
///
/// A definitive decline is NOT a `RailError`: the rail answers with a
/// `PaymentResult` whose status is `FAILED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailError {
    Transport { reason: String },
}

impl fmt::Display for RailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailError::Transport { reason } => write!(f, "payment rail transport failure: {reason}"),
        }
    }
}

impl std::error::Error for RailError {}

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    Validation(ValidationError),
    Registration(RegistrationError),
    RiskRejected {
        score: RiskScore,
        block_at: RiskScore,
    },
    /// Clearance presented at payment belongs to a different mandate.
    ClearanceMismatch {
        mandate_id: Uuid,
        cleared_id: Uuid,
    },
    PaymentDeclined {
        transaction_id: String,
        status: PaymentStatus,
        rail: String,
    },
    PaymentTransport(RailError),
    /// Cancellation observed between steps; `before` never ran.
    Cancelled {
        before: WorkflowStep,
    },
    /// The audit log refused an append.
    Audit {
        step: WorkflowStep,
        reason: String,
    },
}

impl WorkflowError {
    /// Stable code recorded as `error_kind` in the audit trail.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "VALIDATION_ERROR",
            WorkflowError::Registration(_) => "REGISTRATION_ERROR",
            WorkflowError::RiskRejected { .. } => "RISK_REJECTED",
            WorkflowError::ClearanceMismatch { .. } => "CLEARANCE_MISMATCH",
            WorkflowError::PaymentDeclined { .. } => "PAYMENT_DECLINED",
            WorkflowError::PaymentTransport(_) => "PAYMENT_TRANSPORT_ERROR",
            WorkflowError::Cancelled { .. } => "CANCELLED",
            WorkflowError::Audit { .. } => "AUDIT_ERROR",
        }
    }

    /// The step this error aborted.
    pub fn step(&self) -> WorkflowStep {
        match self {
            WorkflowError::Validation(_) => WorkflowStep::IssueMandate,
            WorkflowError::Registration(_) => WorkflowStep::Register,
            WorkflowError::RiskRejected { .. } => WorkflowStep::RiskCheck,
            WorkflowError::ClearanceMismatch { .. }
            | WorkflowError::PaymentDeclined { .. }
            | WorkflowError::PaymentTransport(_) => WorkflowStep::ExecutePayment,
            WorkflowError::Cancelled { before } => *before,
            WorkflowError::Audit { step, .. } => *step,
        }
    }

    /// Whether re-running the same request may succeed.
    ///
    /// Declines and risk rejections are definitive. Transport failures are
    /// retryable because both registry and rail are idempotent on mandate id.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Registration(e) => e.is_retryable(),
            WorkflowError::PaymentTransport(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::Validation(e) => write!(f, "VALIDATION_ERROR: {e}"),
            WorkflowError::Registration(e) => write!(f, "REGISTRATION_ERROR: {e}"),
            WorkflowError::RiskRejected { score, block_at } => write!(
                f,
                "RISK_REJECTED: risk score {score} is at or above the blocking level {block_at}"
            ),
            WorkflowError::ClearanceMismatch {
                mandate_id,
                cleared_id,
            } => write!(
                f,
                "CLEARANCE_MISMATCH: clearance for {cleared_id} presented for mandate {mandate_id}"
            ),
            WorkflowError::PaymentDeclined {
                transaction_id,
                status,
                rail,
            } => write!(
                f,
                "PAYMENT_DECLINED: rail {rail} returned {status} for transaction {transaction_id}"
            ),
            WorkflowError::PaymentTransport(e) => write!(f, "PAYMENT_TRANSPORT_ERROR: {e}"),
            WorkflowError::Cancelled { before } => {
                write!(f, "CANCELLED: workflow cancelled before {before}")
            }
            WorkflowError::Audit { step, reason } => {
                write!(f, "AUDIT_ERROR: append failed during {step}: {reason}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::Validation(e) => Some(e),
            WorkflowError::Registration(e) => Some(e),
            WorkflowError::PaymentTransport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for WorkflowError {
    fn from(e: ValidationError) -> Self {
        WorkflowError::Validation(e)
    }
}

impl From<RegistrationError> for WorkflowError {
    fn from(e: RegistrationError) -> Self {
        WorkflowError::Registration(e)
    }
}

impl From<RailError> for WorkflowError {
    fn from(e: RailError) -> Self {
        WorkflowError::PaymentTransport(e)
    }
}
