//! ap2-mandate
//!
//! The mandate lifecycle: issue → register → convert → risk check → pay.
//!
//! - [`Mandate`] ids are assigned once, at issuance, and carried unchanged
//!   through every later step.
//! - The intent and payment phases are distinct types ([`IntentMandate`],
//!   [`PaymentMandate`]); payment cannot be invoked on an unconverted mandate.
//! - Payment additionally requires a [`RiskClearance`], which only the risk
//!   step can mint.
//! - External collaborators sit behind [`MandateRegistry`], [`RiskScorer`]
//!   and [`PaymentRail`]. The `Paper*` adapters are in-memory stand-ins.
//! - [`MandateWorkflow`] runs the five steps in order, appending one audit
//!   record per logged step, and stops at the first failure.

mod error;
mod rail;
mod registry;
mod risk;
mod types;
mod wiring;
mod workflow;

pub use error::{RailError, RegistrationError, ValidationError, WorkflowError};
pub use rail::{PaperRail, PaymentRail};
pub use registry::{MandateRegistry, PaperRegistry, RegistrationReceipt};
pub use risk::{AmountBandScorer, RiskClearance, RiskPolicy, RiskScorer};
pub use types::{IntentMandate, Mandate, MandateParams, PaymentMandate};
pub use wiring::{paper_workflow, PaperWorkflow, PAPER_REGISTRY_AUTHORITY};
pub use workflow::{
    convert_to_payment, issue_intent_mandate, CancelSignal, MandateWorkflow, NeverCancel,
    WorkflowOutcome, DEFAULT_REGISTRATION_ATTEMPTS,
};
