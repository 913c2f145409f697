use anyhow::Result;
use ap2_config::DemoConfig;

use crate::{AmountBandScorer, MandateWorkflow, PaperRail, PaperRegistry, RiskPolicy};

/// Authority the paper registry reports on its receipts.
pub const PAPER_REGISTRY_AUTHORITY: &str = "CBUAE";

/// Workflow over the in-memory adapters.
pub type PaperWorkflow = MandateWorkflow<PaperRegistry, AmountBandScorer, PaperRail>;

/// Build the paper workflow from config: risk bands and policy, registration
/// attempts, and the rail name.
pub fn paper_workflow(cfg: &DemoConfig) -> Result<PaperWorkflow> {
    let scorer = AmountBandScorer::new(cfg.risk.medium_at_micros()?, cfg.risk.high_at_micros()?);
    Ok(MandateWorkflow::new(
        PaperRegistry::new(PAPER_REGISTRY_AUTHORITY),
        scorer,
        PaperRail::new(cfg.payment.rail.clone()),
    )
    .with_policy(RiskPolicy::new(cfg.risk.block_at))
    .with_registration_attempts(cfg.registry.attempts))
}
