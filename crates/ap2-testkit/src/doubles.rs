use ap2_mandate::{
    CancelSignal, IntentMandate, MandateRegistry, PaperRegistry, PaymentMandate, PaymentRail,
    RailError, RegistrationError, RegistrationReceipt, RiskScorer,
};
use ap2_schemas::{PaymentResult, PaymentStatus, RiskScore};
use chrono::Utc;
use std::cell::Cell;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// Unreachable for the first `failures` calls, then delegates to a paper
/// registry.
#[derive(Debug)]
pub struct FlakyRegistry {
    failures_left: Cell<u32>,
    calls: Cell<u32>,
    inner: PaperRegistry,
}

impl FlakyRegistry {
    pub fn new(failures: u32) -> Self {
        Self {
            failures_left: Cell::new(failures),
            calls: Cell::new(0),
            inner: PaperRegistry::new("CBUAE"),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl MandateRegistry for FlakyRegistry {
    fn register(&self, mandate: &IntentMandate) -> Result<RegistrationReceipt, RegistrationError> {
        self.calls.set(self.calls.get() + 1);
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            return Err(RegistrationError::Unreachable {
                reason: "connection refused".to_string(),
            });
        }
        self.inner.register(mandate)
    }
}

/// Refuses every mandate.
#[derive(Debug, Default)]
pub struct RejectingRegistry {
    calls: Cell<u32>,
}

impl RejectingRegistry {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl MandateRegistry for RejectingRegistry {
    fn register(&self, _mandate: &IntentMandate) -> Result<RegistrationReceipt, RegistrationError> {
        self.calls.set(self.calls.get() + 1);
        Err(RegistrationError::Rejected {
            reason: "mandate limit exceeded".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Returns the same score for every mandate.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub RiskScore);

impl RiskScorer for FixedScorer {
    fn score(&self, _mandate: &PaymentMandate) -> RiskScore {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Rails
// ---------------------------------------------------------------------------

/// Answers every submission with a definitive `FAILED`.
#[derive(Debug, Default)]
pub struct DecliningRail {
    calls: Cell<u32>,
}

impl DecliningRail {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl PaymentRail for DecliningRail {
    fn name(&self) -> &str {
        "Aani"
    }

    fn submit(&self, _mandate: &PaymentMandate) -> Result<PaymentResult, RailError> {
        self.calls.set(self.calls.get() + 1);
        Ok(PaymentResult {
            transaction_id: Uuid::new_v4().to_string(),
            status: PaymentStatus::Failed,
            rail: self.name().to_string(),
            settlement_time: Utc::now(),
        })
    }
}

/// Never gets an answer through.
#[derive(Debug, Default)]
pub struct TransportFailRail {
    calls: Cell<u32>,
}

impl TransportFailRail {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl PaymentRail for TransportFailRail {
    fn name(&self) -> &str {
        "Aani"
    }

    fn submit(&self, _mandate: &PaymentMandate) -> Result<PaymentResult, RailError> {
        self.calls.set(self.calls.get() + 1);
        Err(RailError::Transport {
            reason: "read timed out".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Lets `allowed` polls through, then reports cancelled on every later poll.
#[derive(Debug)]
pub struct CancelAfter {
    allowed: u32,
    polls: Cell<u32>,
}

impl CancelAfter {
    pub fn new(allowed: u32) -> Self {
        Self {
            allowed,
            polls: Cell::new(0),
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl CancelSignal for CancelAfter {
    fn is_cancelled(&self) -> bool {
        let n = self.polls.get();
        self.polls.set(n + 1);
        n >= self.allowed
    }
}
