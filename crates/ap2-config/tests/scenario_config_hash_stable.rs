//! Config hash stability.
//!
//! GREEN when:
//! - The hash depends on merged content only, not on key order in a layer.
//! - An overlay that changes a value changes the hash.
//! - An overlay that restates base values leaves the hash unchanged.

use ap2_config::{load_layered_yaml_from_strings, LoadedConfig};

const SHOP: &str = "
merchant:
  id: \"merchant:amazon-uae\"
payment:
  rail: \"Aani\"
risk:
  medium_at: 1000.0
  high_at: 5000.0
";

const SHOP_SHUFFLED: &str = "
risk:
  high_at: 5000.0
  medium_at: 1000.0
payment:
  rail: \"Aani\"
merchant:
  id: \"merchant:amazon-uae\"
";

const WIRE_RAIL: &str = "
payment:
  rail: \"UAEFTS\"
risk:
  high_at: 2500.0
";

const RESTATE: &str = "
payment:
  rail: \"Aani\"
";

fn load(layers: &[&str]) -> LoadedConfig {
    load_layered_yaml_from_strings(layers).expect("layers should merge")
}

#[test]
fn key_order_inside_a_layer_does_not_matter() {
    let plain = load(&[SHOP]);
    let shuffled = load(&[SHOP_SHUFFLED]);
    assert_eq!(plain.canonical_json, shuffled.canonical_json);
    assert_eq!(plain.config_hash, shuffled.config_hash);
}

#[test]
fn repeated_loads_agree() {
    assert_eq!(load(&[SHOP, WIRE_RAIL]).config_hash, load(&[SHOP, WIRE_RAIL]).config_hash);
}

#[test]
fn changing_overlay_moves_the_hash_and_keeps_other_keys() {
    let base = load(&[SHOP]);
    let wired = load(&[SHOP, WIRE_RAIL]);
    assert_ne!(base.config_hash, wired.config_hash);

    assert_eq!(wired.config_json["payment"]["rail"], "UAEFTS");
    assert_eq!(wired.config_json["risk"]["high_at"], 2500.0);
    assert_eq!(wired.config_json["risk"]["medium_at"], 1000.0);
    assert_eq!(wired.config_json["merchant"]["id"], "merchant:amazon-uae");
}

#[test]
fn restating_base_values_is_a_no_op() {
    assert_eq!(load(&[SHOP]).config_hash, load(&[SHOP, RESTATE]).config_hash);
}

#[test]
fn hash_is_lowercase_sha256_hex() {
    let h = load(&[SHOP]).config_hash;
    assert_eq!(h.len(), 64);
    assert!(h.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
}
