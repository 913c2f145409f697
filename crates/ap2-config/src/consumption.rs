//! Which config keys the flow actually reads, and which it ignores.
//!
//! Every entry in [`consumed_pointers`] is a JSON Pointer. A leaf is
//! "consumed" when its pointer equals a registered one or sits beneath it
//! segment-wise. Anything else is reported; the caller's
//! [`UnusedKeyPolicy`] decides between a warning and a hard error.
//!
//! The list mirrors the fields of [`crate::DemoConfig`] one to one.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

static CONSUMED: &[&str] = &[
    "/shopper/name",
    "/shopper/shipping_address",
    "/merchant/id",
    "/catalog/path",
    "/catalog/shortlist_size",
    "/payment/rail",
    "/risk/medium_at",
    "/risk/high_at",
    "/risk/block_at",
    "/registry/attempts",
    "/audit/hash_chain",
];

/// How many unused pointers an error message lists before eliding.
const ERROR_PREVIEW: usize = 12;

pub fn consumed_pointers() -> &'static [&'static str] {
    CONSUMED
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Registered pointers this report was computed against (sorted).
    pub consumed_prefixes: Vec<String>,
    /// Leaves not covered by any registered pointer (sorted, unique).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Compare every leaf of `config_json` against the consumed registry.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let registered: Vec<Vec<&str>> = CONSUMED.iter().map(|p| segments(p)).collect();

    let mut unused: Vec<String> = leaves(config_json)
        .into_iter()
        .map(|(pointer, _)| pointer)
        .filter(|leaf| {
            let leaf_segs = segments(leaf);
            !registered.iter().any(|reg| leaf_segs.starts_with(reg))
        })
        .collect();
    unused.sort();
    unused.dedup();

    let mut consumed_prefixes: Vec<String> = CONSUMED.iter().map(|p| p.to_string()).collect();
    consumed_prefixes.sort();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&str> = report
            .unused_leaf_pointers
            .iter()
            .take(ERROR_PREVIEW)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by anything: {}",
            report.unused_leaf_pointers.len(),
            shown.join(", ")
        );
    }

    Ok(report)
}

/// Non-empty segments of a pointer. `/a/b/` and `a/b` both give `["a", "b"]`.
fn segments(pointer: &str) -> Vec<&str> {
    pointer.split('/').filter(|s| !s.is_empty()).collect()
}

/// Every scalar (or empty container) in `v`, paired with its JSON Pointer.
///
/// Object keys are escaped per RFC 6901 (`~` as `~0`, `/` as `~1`). A
/// scalar root is reported as `/`.
pub(crate) fn leaves(v: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), v)];

    while let Some((at, node)) = stack.pop() {
        match node {
            Value::Object(map) if !map.is_empty() => {
                for (k, child) in map.iter().rev() {
                    let token = k.replace('~', "~0").replace('/', "~1");
                    stack.push((format!("{at}/{token}"), child));
                }
            }
            Value::Array(items) if !items.is_empty() => {
                for (i, child) in items.iter().enumerate().rev() {
                    stack.push((format!("{at}/{i}"), child));
                }
            }
            _ => {
                let pointer = if at.is_empty() { "/".to_string() } else { at };
                out.push((pointer, node));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registered_pointer_covers_only_whole_segments() {
        let cfg = json!({"risk": {"high_at": 1, "high_at_extra": 2}});
        let report = report_unused_keys(&cfg, UnusedKeyPolicy::Warn).unwrap();
        assert_eq!(report.unused_leaf_pointers, vec!["/risk/high_at_extra"]);
    }

    #[test]
    fn leaf_pointers_are_escaped_and_in_key_order() {
        let cfg = json!({"a/b": {"c~d": 1}, "list": [true, "x"]});
        let ptrs: Vec<String> = leaves(&cfg).into_iter().map(|(p, _)| p).collect();
        assert_eq!(ptrs, vec!["/a~1b/c~0d", "/list/0", "/list/1"]);
    }

    #[test]
    fn registry_matches_typed_config_fields() {
        let full = serde_json::to_value(crate::DemoConfig::default()).unwrap();
        let report = report_unused_keys(&full, UnusedKeyPolicy::Fail).unwrap();
        assert!(report.is_clean());
        assert_eq!(leaves(&full).len(), consumed_pointers().len());
    }
}
