use ap2_schemas::{PaymentResult, PaymentStatus};
use chrono::Utc;
use std::cell::RefCell;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{PaymentMandate, RailError};

/// A payment rail that settles payment mandates.
///
/// # Contract
/// - `Ok` with `FAILED` status is a definitive decline.
/// - `Err(RailError)` means the outcome is unknown to the caller.
/// - Submission MUST be idempotent on `mandate.id()`: a repeated submit
///   returns the original result instead of paying twice.
pub trait PaymentRail {
    fn name(&self) -> &str;

    fn submit(&self, mandate: &PaymentMandate) -> Result<PaymentResult, RailError>;
}

impl<T: PaymentRail + ?Sized> PaymentRail for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit(&self, mandate: &PaymentMandate) -> Result<PaymentResult, RailError> {
        (**self).submit(mandate)
    }
}

/// In-memory rail that settles every mandate immediately with `SUCCESS`.
#[derive(Debug, Default)]
pub struct PaperRail {
    name: String,
    settled: RefCell<BTreeMap<Uuid, PaymentResult>>,
}

impl PaperRail {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settled: RefCell::new(BTreeMap::new()),
        }
    }

    /// Number of distinct mandates settled.
    pub fn settled_count(&self) -> usize {
        self.settled.borrow().len()
    }
}

impl PaymentRail for PaperRail {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, mandate: &PaymentMandate) -> Result<PaymentResult, RailError> {
        let mut settled = self.settled.borrow_mut();
        if let Some(existing) = settled.get(&mandate.id()) {
            return Ok(existing.clone());
        }

        let result = PaymentResult {
            transaction_id: Uuid::new_v4().to_string(),
            status: PaymentStatus::Success,
            rail: self.name.clone(),
            settlement_time: Utc::now(),
        };
        settled.insert(mandate.id(), result.clone());
        Ok(result)
    }
}
