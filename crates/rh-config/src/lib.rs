//! rh-config
//!
//! Layered YAML configuration for the rate history tools.
//!
//! Layers merge in order (earlier = base, later = override), objects merge
//! recursively, everything else is replaced. The merged document is
//! canonicalised to JSON and hashed (sha256, hex) so two runs can prove they
//! used the same effective configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view of the merged document.
    pub fn tracker(&self) -> Result<TrackerConfig> {
        serde_json::from_value(self.config_json.clone()).context("invalid tracker config")
    }
}

/// Where history documents come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// `<dir>/<lenderId>.json`
    Fs { dir: String },
    /// `GET <base_url>/<lenderId>.json`
    Http { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LenderConfig {
    pub id: String,
    pub name: String,
}

/// Defaults for `compare` when the caller does not override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareDefaults {
    /// `pdh` | `btl`
    #[serde(default)]
    pub buyer_category: Option<String>,
    /// `variable` | `fixed-{term}`
    #[serde(default)]
    pub rate_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    #[serde(default)]
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub lenders: Vec<LenderConfig>,
    #[serde(default)]
    pub compare: CompareDefaults,
}

impl TrackerConfig {
    pub fn lender_ids(&self) -> Vec<String> {
        self.lenders.iter().map(|l| l.id.clone()).collect()
    }

    /// Lender id -> display name.
    pub fn lender_names(&self) -> BTreeMap<String, String> {
        self.lenders
            .iter()
            .map(|l| (l.id.clone(), l.name.clone()))
            .collect()
    }
}

/// Read each path and merge in order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read config layer {p}")))
        .collect::<Result<Vec<String>>>()?;
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (idx, raw) in yaml_docs.iter().enumerate() {
        if let Some(layer) = parse_layer(raw).with_context(|| format!("config layer #{idx}"))? {
            overlay(&mut merged, layer);
        }
    }

    let canonical_json =
        serde_json::to_string(&key_sorted(&merged)).context("serialize merged tracker config")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// YAML text to JSON. `None` for an empty layer, which must not wipe the
/// layers below it.
fn parse_layer(raw: &str) -> Result<Option<Value>> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
    let json = serde_json::to_value(yaml).context("yaml layer is not representable as json")?;
    Ok((!json.is_null()).then_some(json))
}

/// Fold `top` into `base` in place. Mappings recurse key by key; any other
/// value (lists included) replaces what was there.
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, top_val) in top_map {
                match base_map.get_mut(&key) {
                    Some(slot) => overlay(slot, top_val),
                    None => {
                        base_map.insert(key, top_val);
                    }
                }
            }
        }
        (slot, top_val) => *slot = top_val,
    }
}

/// Copy of `v` with every mapping rebuilt in key order, so the compact
/// serialization does not depend on layer order or on serde_json's
/// `preserve_order` feature.
fn key_sorted(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), key_sorted(&map[k.as_str()])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(key_sorted).collect()),
        other => other.clone(),
    }
}
