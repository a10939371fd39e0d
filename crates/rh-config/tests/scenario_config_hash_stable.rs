//! Config hash stability
//!
//! GREEN when:
//! - loading the same layers twice yields the same hash
//! - reordering keys within a layer does not change the hash
//! - different values produce different hashes
//! - an overlay changes the hash and wins over the base

use rh_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
source:
  kind: fs
  dir: data/history
lenders:
  - id: aib
    name: AIB
  - id: boi
    name: Bank of Ireland
compare:
  buyer_category: pdh
"#;

const BASE_YAML_REORDERED: &str = r#"
compare:
  buyer_category: pdh
lenders:
  - name: AIB
    id: aib
  - name: Bank of Ireland
    id: boi
source:
  dir: data/history
  kind: fs
"#;

const OVERLAY_YAML: &str = r#"
source:
  kind: http
  base_url: "https://rates.example.com/history"
compare:
  rate_type: fixed-3
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn different_values_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[&BASE_YAML.replace("pdh", "btl")]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_wins_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged.config_json.pointer("/source/kind").and_then(|v| v.as_str()),
        Some("http")
    );
    // merged objects keep base siblings
    assert_eq!(
        merged
            .config_json
            .pointer("/compare/buyer_category")
            .and_then(|v| v.as_str()),
        Some("pdh")
    );
}
