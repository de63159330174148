use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// Spec §6 exit codes: a config that can't be read or fails validation
/// must exit `2`, never panic or hang.
#[test]
fn missing_config_file_exits_with_code_2() {
    let mut cmd = Command::cargo_bin("nv").unwrap();
    cmd.args(["run", "--config", "/nonexistent/nv-config-does-not-exist.yaml"]);
    cmd.assert().failure().code(2).stderr(predicate::str::contains("config error"));
}

#[test]
fn inspect_snapshot_with_missing_config_exits_with_code_2() {
    let mut cmd = Command::cargo_bin("nv").unwrap();
    cmd.args(["inspect", "snapshot", "--config", "/nonexistent/nv-config-does-not-exist.yaml"]);
    cmd.assert().failure().code(2);
}
