use ap2_schemas::{format_amount, Product, ShopperProfile};
use serde::Serialize;
use uuid::Uuid;

use crate::ValidationError;

/// Order parameters a mandate is issued from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandateParams {
    pub user: String,
    pub merchant: String,
    /// Integer micros (1 unit = 1_000_000).
    pub amount_micros: i64,
    pub currency: String,
    pub description: String,
}

impl MandateParams {
    /// Parameters for buying `product` from `merchant` on behalf of `shopper`.
    pub fn for_product(
        shopper: &ShopperProfile,
        merchant: &str,
        product: &Product,
    ) -> Result<Self, ValidationError> {
        let amount_micros = product
            .price_micros()
            .map_err(ValidationError::UnrepresentableAmount)?;
        Ok(Self {
            user: shopper.name.clone(),
            merchant: merchant.to_string(),
            amount_micros,
            currency: product.currency.clone(),
            description: product.order_description(),
        })
    }

    /// Checked before issuance. First failing rule wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user.trim().is_empty() {
            return Err(ValidationError::MissingUser);
        }
        if self.merchant.trim().is_empty() {
            return Err(ValidationError::MissingMerchant);
        }
        if self.amount_micros <= 0 {
            return Err(ValidationError::NonPositiveAmount {
                amount_micros: self.amount_micros,
            });
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingCurrency);
        }
        Ok(())
    }
}

/// A user's authorized intent to pay.
///
/// Fields are read-only after issuance; `id` in particular is never
/// regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mandate {
    id: Uuid,
    user: String,
    merchant: String,
    amount_micros: i64,
    currency: String,
    description: String,
}

impl Mandate {
    pub(crate) fn issue(params: MandateParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: params.user,
            merchant: params.merchant,
            amount_micros: params.amount_micros,
            currency: params.currency,
            description: params.description,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn amount_micros(&self) -> i64 {
        self.amount_micros
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// e.g. `AED 129.99`
    pub fn display_amount(&self) -> String {
        format_amount(self.amount_micros, &self.currency)
    }
}

/// Mandate in its intent phase (issued, possibly registered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntentMandate(pub(crate) Mandate);

impl IntentMandate {
    pub fn mandate(&self) -> &Mandate {
        &self.0
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

/// Mandate in its payment phase.
///
/// Conversion currently attaches nothing; payment-specific fields (authorized
/// rail, expiry) belong here when a real rail needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaymentMandate(pub(crate) Mandate);

impl PaymentMandate {
    pub fn mandate(&self) -> &Mandate {
        &self.0
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }
}
