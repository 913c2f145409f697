//! ap2-config
//!
//! Layered YAML configuration for the purchase flow.
//!
//! - Layers merge in order: earlier docs are the base, later docs override.
//! - The merged document is hashed (SHA-256 over canonical JSON) so a demo
//!   run can be tied to the exact configuration that produced it.
//! - Secret-looking literals are refused; config stores env var NAMES only.
//! - [`DemoConfig`] is the typed view every other crate consumes.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

mod consumption;
mod demo;

pub use consumption::{consumed_pointers, report_unused_keys, UnusedKeyPolicy, UnusedKeyReport};
pub use demo::{
    AuditSection, CatalogSection, DemoConfig, MerchantSection, PaymentSection, RegistrySection,
    RiskSection,
};

/// Leading markers of credential formats. Any string leaf of 8+ chars that
/// starts with one aborts loading.
const SECRET_MARKERS: &[&str] = &[
    "sk-", "sk_live", "sk_test", // payment/API provider keys
    "AKIA",       // AWS access key id
    "-----BEGIN", // PEM block
    "ghp_", "gho_", "glpat-", // forge tokens
    "xoxb-", "xoxp-", // chat bot/user tokens
];

/// Result of merging config layers.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    /// Compact JSON with keys in sorted order.
    pub canonical_json: String,
    pub config_json: Value,
}

/// Read YAML files in merge order and merge them.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

/// Merge in-memory YAML documents. Blank documents are empty layers.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        if layer.is_null() {
            continue;
        }
        let layer = serde_json::to_value(layer)
            .with_context(|| format!("layer {i} is not representable as json"))?;
        overlay(&mut merged, layer);
    }

    refuse_secret_literals(&merged)?;

    // serde_json's default map is key-ordered, so compact output is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Load layers from disk and extract the typed view in one step.
pub fn load_demo_config(paths: &[&str]) -> Result<(LoadedConfig, DemoConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let cfg = DemoConfig::from_loaded(&loaded)?;
    Ok((loaded, cfg))
}

/// Objects merge key by key; any other value in `top` replaces `base`.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (k, v) in top_map {
                match base_map.get_mut(&k) {
                    Some(existing) => overlay(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (slot, replacement) => *slot = replacement,
    }
}

fn refuse_secret_literals(v: &Value) -> Result<()> {
    for (pointer, leaf) in consumption::leaves(v) {
        if leaf.as_str().is_some_and(looks_like_secret) {
            bail!("CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED");
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_MARKERS.iter().any(|m| t.starts_with(m))
}
