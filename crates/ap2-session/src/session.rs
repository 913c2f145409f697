use ap2_audit::{AuditLog, AuditRecord, WorkflowStep};
use ap2_mandate::{
    CancelSignal, MandateParams, MandateRegistry, MandateWorkflow, NeverCancel, PaymentMandate,
    PaymentRail, RiskScorer, WorkflowError,
};
use ap2_schemas::{format_amount, PaymentResult, Product, ShopperProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Page / SessionAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Landing,
    Shortlist,
    Checkout,
    Confirmation,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Landing => "landing",
            Page::Shortlist => "shortlist",
            Page::Checkout => "checkout",
            Page::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page-bound user actions. `reset` is available everywhere and is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Search,
    Select,
    Confirm,
    Cancel,
    Back,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Search => "search",
            SessionAction::Select => "select",
            SessionAction::Confirm => "confirm",
            SessionAction::Cancel => "cancel",
            SessionAction::Back => "back",
        }
    }

    /// The only page this action is legal on.
    pub fn legal_from(&self) -> Page {
        match self {
            SessionAction::Search => Page::Landing,
            SessionAction::Select | SessionAction::Back => Page::Shortlist,
            SessionAction::Confirm | SessionAction::Cancel => Page::Checkout,
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line in the assistant's message feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub ts: DateTime<Utc>,
    pub text: String,
}

// ---------------------------------------------------------------------------
// OrderSession
// ---------------------------------------------------------------------------

/// All state for one shopper's checkout attempt.
#[derive(Debug, Clone)]
pub struct OrderSession {
    page: Page,
    shortlist: Vec<Product>,
    current_product: Option<Product>,
    mandate: Option<PaymentMandate>,
    audit_log: AuditLog,
    payment_result: Option<PaymentResult>,
    messages: Vec<AssistantMessage>,
}

impl Default for OrderSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OrderSession {
    /// Fresh session on the landing page. `hash_chain` controls the audit log.
    pub fn new(hash_chain: bool) -> Self {
        Self {
            page: Page::Landing,
            shortlist: Vec::new(),
            current_product: None,
            mandate: None,
            audit_log: AuditLog::new(hash_chain),
            payment_result: None,
            messages: Vec::new(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn shortlist(&self) -> &[Product] {
        &self.shortlist
    }

    pub fn current_product(&self) -> Option<&Product> {
        self.current_product.as_ref()
    }

    /// The mandate of the last successful confirmation.
    pub fn mandate(&self) -> Option<&PaymentMandate> {
        self.mandate.as_ref()
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    pub fn payment_result(&self) -> Option<&PaymentResult> {
        self.payment_result.as_ref()
    }

    pub fn messages(&self) -> &[AssistantMessage] {
        &self.messages
    }

    /// The last `n` messages, oldest first.
    pub fn recent_messages(&self, n: usize) -> &[AssistantMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// landing → shortlist. Takes the first `shortlist_size` catalog entries.
    pub fn search(&mut self, catalog: &[Product], shortlist_size: usize) -> Result<(), SessionError> {
        self.require(SessionAction::Search)?;

        self.post_message("Searching the catalog for matching products...");
        self.shortlist = catalog.iter().take(shortlist_size).cloned().collect();
        self.post_message(format!(
            "I found {} options - showing them now.",
            self.shortlist.len()
        ));
        self.page = Page::Shortlist;
        info!(shortlisted = self.shortlist.len(), "session/search");
        Ok(())
    }

    /// shortlist → checkout.
    pub fn select(&mut self, product_id: &str) -> Result<(), SessionError> {
        self.require(SessionAction::Select)?;
        if self.shortlist.is_empty() {
            return Err(SessionError::EmptyShortlist);
        }
        let product = self
            .shortlist
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownProduct {
                product_id: product_id.to_string(),
            })?;

        info!(product_id = %product.id, "session/select");
        self.current_product = Some(product);
        self.page = Page::Checkout;
        Ok(())
    }

    /// checkout → confirmation, running the full mandate workflow.
    pub fn confirm<R, S, P>(
        &mut self,
        workflow: &MandateWorkflow<R, S, P>,
        shopper: &ShopperProfile,
        merchant: &str,
    ) -> Result<&PaymentResult, SessionError>
    where
        R: MandateRegistry,
        S: RiskScorer,
        P: PaymentRail,
    {
        self.confirm_with_cancel(workflow, shopper, merchant, &NeverCancel)
    }

    /// As [`OrderSession::confirm`], polling `cancel` between workflow steps.
    ///
    /// - Success: page becomes confirmation; mandate and payment are stored.
    /// - Cancelled: the session is reset to landing.
    /// - Any other failure: page stays checkout and the audit log keeps the
    ///   `STEP_FAILED` record.
    pub fn confirm_with_cancel<R, S, P>(
        &mut self,
        workflow: &MandateWorkflow<R, S, P>,
        shopper: &ShopperProfile,
        merchant: &str,
        cancel: &dyn CancelSignal,
    ) -> Result<&PaymentResult, SessionError>
    where
        R: MandateRegistry,
        S: RiskScorer,
        P: PaymentRail,
    {
        self.require(SessionAction::Confirm)?;
        let Some(product) = self.current_product.clone() else {
            return Err(SessionError::IllegalTransition {
                from: self.page,
                action: SessionAction::Confirm,
            });
        };

        let params = match MandateParams::for_product(shopper, merchant, &product) {
            Ok(p) => p,
            Err(e) => {
                let err = WorkflowError::Validation(e);
                return Err(self.issue_failed(err).into());
            }
        };

        match workflow.run_with_cancel(params, &mut self.audit_log, cancel) {
            Ok(outcome) => {
                self.post_message(format!(
                    "Order placed: {} for {} via {}.",
                    product.title,
                    format_amount(outcome.mandate.mandate().amount_micros(), &product.currency),
                    outcome.payment.rail
                ));
                info!(
                    mandate_id = %outcome.mandate.id(),
                    transaction_id = %outcome.payment.transaction_id,
                    "session/confirm"
                );
                self.mandate = Some(outcome.mandate);
                self.page = Page::Confirmation;
                Ok(self.payment_result.insert(outcome.payment))
            }
            Err(err @ WorkflowError::Cancelled { .. }) => {
                warn!(error = %err, "session/confirm cancelled; resetting");
                self.reset();
                Err(err.into())
            }
            Err(err) => {
                warn!(error = %err, "session/confirm failed");
                self.post_message(format!("Sorry, the order could not be placed: {err}"));
                Err(err.into())
            }
        }
    }

    /// checkout → landing.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.require(SessionAction::Cancel)?;
        self.reset();
        Ok(())
    }

    /// shortlist → landing.
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.require(SessionAction::Back)?;
        self.reset();
        Ok(())
    }

    /// Any page → landing, with every field back to its default.
    pub fn reset(&mut self) {
        info!(from = %self.page, "session/reset");
        *self = Self::new(self.audit_log.hash_chain());
    }

    fn require(&self, action: SessionAction) -> Result<(), SessionError> {
        if self.page != action.legal_from() {
            return Err(SessionError::IllegalTransition {
                from: self.page,
                action,
            });
        }
        Ok(())
    }

    fn post_message(&mut self, text: impl Into<String>) {
        self.messages.push(AssistantMessage {
            ts: Utc::now(),
            text: text.into(),
        });
    }

    /// Record a failure that happened before the workflow could issue a
    /// mandate, keeping the audit trail consistent with workflow failures.
    fn issue_failed(&mut self, err: WorkflowError) -> WorkflowError {
        warn!(error = %err, "session/confirm failed before issuance");
        let record = AuditRecord::step_failed(
            None,
            WorkflowStep::IssueMandate,
            err.kind(),
            err.to_string(),
        );
        match self.audit_log.append(record) {
            Ok(_) => err,
            Err(e) => WorkflowError::Audit {
                step: WorkflowStep::IssueMandate,
                reason: format!("{e:#}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap2_mandate::{AmountBandScorer, PaperRail, PaperRegistry};

    fn product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            title: format!("Boots {id}"),
            specs: String::new(),
            image: String::new(),
            price,
            currency: "AED".to_string(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("a", 129.99),
            product("b", 349.0),
            product("c", 899.5),
            product("d", 189.0),
        ]
    }

    fn workflow() -> MandateWorkflow<PaperRegistry, AmountBandScorer, PaperRail> {
        MandateWorkflow::new(
            PaperRegistry::new("CBUAE"),
            AmountBandScorer::new(1_000_000_000, 5_000_000_000),
            PaperRail::new("Aani"),
        )
    }

    #[test]
    fn search_takes_catalog_prefix_and_posts_messages() {
        let mut s = OrderSession::default();
        s.search(&catalog(), 3).unwrap();
        assert_eq!(s.page(), Page::Shortlist);
        let ids: Vec<&str> = s.shortlist().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(s.messages().len(), 2);
        assert_eq!(s.messages()[1].text, "I found 3 options - showing them now.");
    }

    #[test]
    fn short_catalog_shortlists_everything() {
        let mut s = OrderSession::default();
        s.search(&catalog()[..2], 3).unwrap();
        assert_eq!(s.shortlist().len(), 2);
    }

    #[test]
    fn select_requires_a_shortlisted_id() {
        let mut s = OrderSession::default();
        s.search(&catalog(), 3).unwrap();
        assert_eq!(
            s.select("d"),
            Err(SessionError::UnknownProduct {
                product_id: "d".to_string()
            })
        );
        assert_eq!(s.page(), Page::Shortlist);
        s.select("b").unwrap();
        assert_eq!(s.page(), Page::Checkout);
        assert_eq!(s.current_product().unwrap().id, "b");
    }

    #[test]
    fn actions_on_the_wrong_page_leave_the_session_unchanged() {
        let mut s = OrderSession::default();
        assert_eq!(
            s.select("a"),
            Err(SessionError::IllegalTransition {
                from: Page::Landing,
                action: SessionAction::Select
            })
        );
        assert!(s.cancel().is_err());
        assert!(s
            .confirm(&workflow(), &ShopperProfile::default(), "m")
            .is_err());
        assert_eq!(s.page(), Page::Landing);
        assert!(s.audit_log().is_empty());

        s.search(&catalog(), 3).unwrap();
        assert!(matches!(
            s.search(&catalog(), 3),
            Err(SessionError::IllegalTransition { .. })
        ));
        assert_eq!(s.messages().len(), 2);
    }

    #[test]
    fn back_and_cancel_reset_to_landing() {
        let mut s = OrderSession::default();
        s.search(&catalog(), 3).unwrap();
        s.back().unwrap();
        assert_eq!(s.page(), Page::Landing);
        assert!(s.shortlist().is_empty());
        assert!(s.messages().is_empty());

        s.search(&catalog(), 3).unwrap();
        s.select("a").unwrap();
        s.cancel().unwrap();
        assert_eq!(s.page(), Page::Landing);
        assert!(s.current_product().is_none());
    }

    #[test]
    fn confirm_moves_to_confirmation_and_stores_results() {
        let wf = workflow();
        let mut s = OrderSession::default();
        s.search(&catalog(), 3).unwrap();
        s.select("a").unwrap();
        let tx = s
            .confirm(&wf, &ShopperProfile::default(), "merchant:amazon-uae")
            .unwrap()
            .transaction_id
            .clone();

        assert_eq!(s.page(), Page::Confirmation);
        assert_eq!(s.payment_result().unwrap().transaction_id, tx);
        assert_eq!(s.mandate().unwrap().mandate().amount_micros(), 129_990_000);
        assert_eq!(s.audit_log().len(), 4);
        assert_eq!(
            s.messages().last().unwrap().text,
            "Order placed: Boots a for AED 129.99 via Aani."
        );
    }

    #[test]
    fn unpriceable_product_fails_at_issuance_and_stays_in_checkout() {
        let wf = workflow();
        let mut s = OrderSession::default();
        s.search(&[product("nan", f64::NAN)], 3).unwrap();
        s.select("nan").unwrap();

        let err = s
            .confirm(&wf, &ShopperProfile::default(), "merchant:amazon-uae")
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Workflow(WorkflowError::Validation(_))
        ));
        assert_eq!(s.page(), Page::Checkout);
        assert_eq!(s.audit_log().events(), vec!["STEP_FAILED"]);
    }

    #[test]
    fn recent_messages_returns_the_tail() {
        let mut s = OrderSession::default();
        s.search(&catalog(), 3).unwrap();
        assert_eq!(s.recent_messages(1).len(), 1);
        assert_eq!(s.recent_messages(10).len(), 2);
    }
}
