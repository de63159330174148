//! Layered YAML/JSON config loading: later paths deep-merge over earlier
//! ones, the merged document is canonicalized (recursive key sort) and
//! SHA-256-hashed for run attribution.

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load + merge YAML or JSON files in order (detected by extension; `.yml`/
/// `.yaml` parse as YAML, everything else as JSON), then canonicalize and
/// hash the merged document.
pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let p = p.as_ref();
        let s = fs::read_to_string(p)
            .with_context(|| format!("read config: {}", p.display()))?;
        let is_yaml = matches!(
            p.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        );
        let json_val = if is_yaml {
            let yaml_val: serde_yaml::Value = serde_yaml::from_str(&s)
                .with_context(|| format!("parse yaml: {}", p.display()))?;
            serde_json::to_value(yaml_val).context("yaml->json conversion failed")?
        } else {
            serde_json::from_str(&s).with_context(|| format!("parse json: {}", p.display()))?
        };
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonicalize_json(&merged);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse failed")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nv-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn later_file_overrides_earlier() {
        let base = write_tmp("base.yaml", "a: 1\nb: 2\n");
        let override_ = write_tmp("override.yaml", "b: 3\n");
        let loaded = load_layered(&[base, override_]).unwrap();
        assert_eq!(loaded.config_json["a"], 1);
        assert_eq!(loaded.config_json["b"], 3);
    }

    #[test]
    fn hash_is_deterministic_regardless_of_key_order() {
        let a = write_tmp("a1.yaml", "a: 1\nb: 2\n");
        let b = write_tmp("a2.yaml", "b: 2\na: 1\n");
        let h1 = load_layered(&[a]).unwrap().config_hash;
        let h2 = load_layered(&[b]).unwrap().config_hash;
        assert_eq!(h1, h2);
    }
}
