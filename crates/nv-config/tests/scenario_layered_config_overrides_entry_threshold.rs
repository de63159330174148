use std::fs;
use std::io::Write;

fn write_tmp(name: &str, contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nv-config-scenario-{}-{}",
        std::process::id(),
        name
    ));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn override_file_changes_entry_threshold_and_keeps_other_defaults() {
    let base = write_tmp(
        "base.yaml",
        r#"
symbol_specs:
  ES:
    tick_size: 0.25
"#,
    );
    let overrides = write_tmp(
        "overrides.yaml",
        r#"
thresholds:
  mia_long: 0.20
  mia_short: -0.20
  entry: 0.80
  premium: 0.85
  strong: 0.75
  good: 0.70
  correlation_floor_by_vix:
    low: 0.2
    mid: 0.25
    high: 0.35
    extreme: 0.4
  leadership_by_vix:
    low: { soft: 0.5, hard: 1.4, bonus_factor: 1.05, extra_of_confirms: 0 }
    mid: { soft: 0.5, hard: 1.3, bonus_factor: 1.05, extra_of_confirms: 0 }
    high: { soft: 0.5, hard: 1.1, bonus_factor: 1.0, extra_of_confirms: 1 }
    extreme: { soft: 0.4, hard: 1.0, bonus_factor: 1.0, extra_of_confirms: 1 }
"#,
    );

    let (cfg, loaded) = nv_config::load_config(&[base, overrides]).unwrap();
    assert_eq!(cfg.thresholds.entry, 0.80);
    assert_eq!(cfg.tick_size("ES").unwrap(), 0.25);
    // Untouched section still carries its spec default.
    assert_eq!(cfg.weights.mq, 0.55);
    assert_eq!(loaded.config_hash.len(), 64);
}
