use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{IntentMandate, RegistrationError};

/// Acknowledgement from the registry/authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReceipt {
    pub mandate_id: Uuid,
    pub authority: String,
    pub registry_ref: String,
    pub registered_at: DateTime<Utc>,
}

/// Registry/authority a mandate must be registered with before payment.
///
/// # Contract
/// Implementations MUST be idempotent on `mandate.id()`: registering the same
/// mandate again returns the original receipt and has no further effect.
pub trait MandateRegistry {
    fn register(&self, mandate: &IntentMandate) -> Result<RegistrationReceipt, RegistrationError>;
}

impl<T: MandateRegistry + ?Sized> MandateRegistry for &T {
    fn register(&self, mandate: &IntentMandate) -> Result<RegistrationReceipt, RegistrationError> {
        (**self).register(mandate)
    }
}

/// In-memory registry. Accepts everything; keeps receipts keyed by mandate id.
#[derive(Debug, Default)]
pub struct PaperRegistry {
    authority: String,
    receipts: RefCell<BTreeMap<Uuid, RegistrationReceipt>>,
}

impl PaperRegistry {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            receipts: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn registered_count(&self) -> usize {
        self.receipts.borrow().len()
    }
}

impl MandateRegistry for PaperRegistry {
    fn register(&self, mandate: &IntentMandate) -> Result<RegistrationReceipt, RegistrationError> {
        let id = mandate.id();
        let mut receipts = self.receipts.borrow_mut();
        if let Some(existing) = receipts.get(&id) {
            return Ok(existing.clone());
        }

        let receipt = RegistrationReceipt {
            mandate_id: id,
            authority: self.authority.clone(),
            registry_ref: format!("paper:reg:{}", id.as_simple()),
            registered_at: Utc::now(),
        };
        receipts.insert(id, receipt.clone());
        Ok(receipt)
    }
}
