use anyhow::{bail, Context, Result};
use ap2_schemas::Product;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Read a catalog file: a JSON array of products.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Product>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read catalog {:?}", path))?;
    parse_catalog(&raw).with_context(|| format!("parse catalog {:?}", path))
}

/// Parse catalog JSON. Order is preserved; product ids must be unique.
pub fn parse_catalog(raw: &str) -> Result<Vec<Product>> {
    let products: Vec<Product> =
        serde_json::from_str(raw).context("catalog is not a JSON array of products")?;

    let mut seen = BTreeSet::new();
    for p in &products {
        if !seen.insert(p.id.as_str()) {
            bail!("CATALOG_INVALID duplicate product id {}", p.id);
        }
    }
    Ok(products)
}
