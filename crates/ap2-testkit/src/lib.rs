//! Test doubles and fixtures for the purchase flow.
//!
//! The doubles implement the adapter traits from `ap2-mandate` with scripted
//! behavior (unreachable registry, declining rail, fixed risk score) and
//! count their calls so scenarios can assert what was, and was not, invoked.

use anyhow::{Context, Result};
use ap2_mandate::{AmountBandScorer, MandateParams, MandateWorkflow, PaperRail, PaperRegistry};
use ap2_schemas::Product;
use ap2_session::{OrderSession, SessionError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

mod doubles;

pub use doubles::{
    CancelAfter, DecliningRail, FixedScorer, FlakyRegistry, RejectingRegistry, TransportFailRail,
};

/// Paper workflow with the default bands (LOW < 1000 <= MEDIUM < 5000 <= HIGH).
pub fn paper_workflow_default() -> MandateWorkflow<PaperRegistry, AmountBandScorer, PaperRail> {
    MandateWorkflow::new(
        PaperRegistry::new("CBUAE"),
        AmountBandScorer::new(1_000_000_000, 5_000_000_000),
        PaperRail::new("Aani"),
    )
}

pub fn product(id: &str, title: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        specs: "fixture".to_string(),
        image: String::new(),
        price,
        currency: "AED".to_string(),
    }
}

/// Three in-budget boots plus one that scores HIGH under default bands.
pub fn fixture_catalog() -> Vec<Product> {
    vec![
        product("boots-low", "Hiking Boots", 129.99),
        product("boots-mid", "Expedition Boots", 1_250.0),
        product("boots-high", "Heated Summit Boots", 6_400.0),
        product("boots-spare", "Trail Runners", 189.0),
    ]
}

/// The reference order: Aamir buying hiking boots for AED 129.99.
pub fn reference_params() -> MandateParams {
    MandateParams {
        user: "Aamir".to_string(),
        merchant: "merchant:amazon-uae".to_string(),
        amount_micros: 129_990_000,
        currency: "AED".to_string(),
        description: "Order Hiking Boots".to_string(),
    }
}

/// Write `products` as a catalog file in a fresh temp dir.
///
/// Keep the returned `TempDir` alive for as long as the path is used.
pub fn write_catalog(products: &[Product]) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("products.json");
    let body = serde_json::to_string_pretty(products).context("serialize catalog")?;
    fs::write(&path, body).with_context(|| format!("write catalog {:?}", path))?;
    Ok((dir, path))
}

/// Drive a fresh session from landing to checkout on `product_id`.
pub fn session_at_checkout(catalog: &[Product], product_id: &str) -> Result<OrderSession, SessionError> {
    let mut s = OrderSession::default();
    s.search(catalog, catalog.len())?;
    s.select(product_id)?;
    Ok(s)
}
