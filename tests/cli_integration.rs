//! CLI integration tests for fedtypes.
//!
//! These tests run the binary against package trees in temporary
//! directories. `tsc` is replaced by a small shell script, configured through
//! the project config, so they only run on unix.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Writes the checkout bundle to `--outFile`, like a successful `tsc` run.
const EMITTING_TSC: &str = r##"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--outFile" ]; then
    out="$2"
    shift
  fi
  shift
done
mkdir -p "$(dirname "$out")"
cat > "$out" <<'DTS'
declare module "Cart" {
    export default function Cart(): JSX.Element;
}
DTS
"##;

/// Reports a syntax error and emits nothing.
const FAILING_TSC: &str = r##"#!/bin/sh
echo "Cart.tsx(1,5): error TS1005: ';' expected."
exit 2
"##;

/// Emits the bundle but also reports a type error.
const NOISY_TSC: &str = r##"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--outFile" ]; then
    out="$2"
    shift
  fi
  shift
done
mkdir -p "$(dirname "$out")"
echo 'declare module "Cart" {}' > "$out"
echo "Cart.tsx(2,7): error TS2322: Type 'string' is not assignable to type 'number'."
exit 2
"##;

const CHECKOUT_MANIFEST: &str = r#"{
  "name": "checkout",
  "exposes": {
    "Cart": "./Cart.tsx"
  }
}"#;

const OUT_DIR: &str = "node_modules/@types/__federated_types";

/// Get the fedtypes binary command, isolated from the user's environment.
fn fedtypes(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fedtypes").unwrap();
    cmd.current_dir(cwd)
        .env("HOME", cwd)
        .env_remove("RUST_LOG")
        .env_remove("FEDTYPES_TSC");
    cmd
}

/// A package with the checkout manifest and its exposed file.
fn checkout_package() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("federation.config.json"), CHECKOUT_MANIFEST).unwrap();
    fs::write(
        tmp.path().join("Cart.tsx"),
        "export default function Cart() { return <div />; }\n",
    )
    .unwrap();
    tmp
}

/// Point the project config at `script` as the compiler.
fn use_fake_tsc(root: &Path, script: &str) {
    let script_path = root.join("fake-tsc.sh");
    fs::write(&script_path, script).unwrap();

    let config_dir = root.join(".fedtypes");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "[compiler]\nprogram = \"sh\"\nargs = [\"{}\"]\n",
            script_path.display()
        ),
    )
    .unwrap();
}

// ============================================================================
// fedtypes build
// ============================================================================

#[test]
fn test_build_checkout_end_to_end() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);

    fedtypes(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Using"))
        .stderr(predicate::str::contains("Finished"));

    let out = tmp.path().join(OUT_DIR);
    let dts = fs::read_to_string(out.join("checkout.d.ts")).unwrap();
    assert!(dts.contains("declare module \"checkout/Cart\""));
    assert!(!dts.contains("declare module \"Cart\""));
    assert_eq!(
        fs::read_to_string(out.join("index.d.ts")).unwrap(),
        "export * from './checkout';\n"
    );

    let stub: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("package.json")).unwrap()).unwrap();
    assert_eq!(stub["types"], "index.d.ts");
}

#[test]
fn test_build_subcommand_is_the_default() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);

    fedtypes(tmp.path()).arg("build").assert().success();

    assert!(tmp.path().join(OUT_DIR).join("checkout.d.ts").exists());
}

#[test]
fn test_rerun_leaves_index_unchanged() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);
    let index = tmp.path().join(OUT_DIR).join("index.d.ts");

    fedtypes(tmp.path()).assert().success();
    let first = fs::read(&index).unwrap();

    fedtypes(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Fresh"));
    assert_eq!(fs::read(&index).unwrap(), first);
}

#[test]
fn test_build_keeps_other_packages() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);
    let out = tmp.path().join(OUT_DIR);
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("index.d.ts"), "export * from './shop';\n").unwrap();
    fs::write(out.join("shop.d.ts"), "declare module \"shop/Button\" {}\n").unwrap();

    fedtypes(tmp.path()).assert().success();

    assert_eq!(
        fs::read_to_string(out.join("index.d.ts")).unwrap(),
        "export * from './shop';\nexport * from './checkout';\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("shop.d.ts")).unwrap(),
        "declare module \"shop/Button\" {}\n"
    );
}

#[test]
fn test_output_dir_alias() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);

    fedtypes(tmp.path())
        .args(["--outputDir", "types"])
        .assert()
        .success();

    assert!(tmp.path().join("types/checkout.d.ts").exists());
    assert!(tmp.path().join("types/index.d.ts").exists());
    // Not a node_modules/@types directory, so no package.json
    assert!(!tmp.path().join("types/package.json").exists());
}

#[test]
fn test_skipped_emission_succeeds() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), FAILING_TSC);

    fedtypes(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("';' expected."))
        .stderr(predicate::str::contains("Skipped"));

    assert!(!tmp.path().join(OUT_DIR).join("index.d.ts").exists());
    assert!(!tmp.path().join(OUT_DIR).join("checkout.d.ts").exists());
}

#[test]
fn test_diagnostics_do_not_block_publishing() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), NOISY_TSC);

    fedtypes(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"))
        .stderr(predicate::str::contains("TS2322"));

    let dts = fs::read_to_string(tmp.path().join(OUT_DIR).join("checkout.d.ts")).unwrap();
    assert!(dts.contains("\"checkout/Cart\""));
}

#[test]
fn test_strict_mode_fails_on_diagnostics() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), NOISY_TSC);

    fedtypes(tmp.path())
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict mode"))
        .stderr(predicate::str::contains("TS2322"));

    assert!(!tmp.path().join(OUT_DIR).join("checkout.d.ts").exists());
    assert!(!tmp.path().join(OUT_DIR).join("index.d.ts").exists());
}

#[test]
fn test_json_messages() {
    let tmp = checkout_package();
    use_fake_tsc(tmp.path(), EMITTING_TSC);

    fedtypes(tmp.path())
        .args(["--message-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"reason\":\"manifest\""))
        .stdout(predicate::str::contains("\"reason\":\"emitted\""))
        .stdout(predicate::str::contains("\"public\":\"checkout/Cart\""));
}

#[test]
fn test_build_fails_without_manifest() {
    let tmp = TempDir::new().unwrap();

    fedtypes(tmp.path())
        .args(["--tsc", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `federation.config.json`"));
}

#[test]
fn test_unique_discovery_rejects_two_manifests() {
    let tmp = TempDir::new().unwrap();
    for dir in ["a", "b"] {
        fs::create_dir_all(tmp.path().join(dir)).unwrap();
        fs::write(
            tmp.path().join(dir).join("federation.config.json"),
            r#"{"name": "x", "exposes": {}}"#,
        )
        .unwrap();
    }

    fedtypes(tmp.path())
        .args(["--discovery", "unique", "--tsc", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("found 2 federation manifests"));
}

#[test]
fn test_explicit_config_must_exist() {
    let tmp = checkout_package();

    fedtypes(tmp.path())
        .args(["--config", "missing.json", "--tsc", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_missing_exposed_file_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("federation.config.json"), CHECKOUT_MANIFEST).unwrap();

    fedtypes(tmp.path())
        .args(["--tsc", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exposed module `Cart`"));
}

// ============================================================================
// fedtypes locate
// ============================================================================

#[test]
fn test_locate_prints_selected_manifest() {
    let tmp = checkout_package();

    fedtypes(tmp.path())
        .arg("locate")
        .assert()
        .success()
        .stdout(predicate::str::diff("federation.config.json\n"));
}

#[test]
fn test_locate_all_skips_vendored_packages() {
    let tmp = TempDir::new().unwrap();
    for dir in ["apps/a", "apps/b", "node_modules/remote"] {
        fs::create_dir_all(tmp.path().join(dir)).unwrap();
        fs::write(
            tmp.path().join(dir).join("federation.config.json"),
            r#"{"name": "x", "exposes": {}}"#,
        )
        .unwrap();
    }

    fedtypes(tmp.path())
        .args(["locate", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apps/a/federation.config.json"))
        .stdout(predicate::str::contains("apps/b/federation.config.json"))
        .stdout(predicate::str::contains("node_modules").not());
}

// ============================================================================
// fedtypes completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    fedtypes(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fedtypes"));
}
