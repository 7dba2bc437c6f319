//! End-to-end tests for the `pages-bundle` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn pages_bundle(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pages-bundle").unwrap();
    cmd.current_dir(dir)
        .env_remove("PAGES_BUNDLE_COMPILER")
        .env("RUST_LOG", "warn");
    cmd
}

/// Writes a stand-in compiler that emits a fixed script to `--outfile`.
#[cfg(unix)]
fn fake_compiler(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-esbuild");
    fs::write(
        &path,
        format!(
            r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --outfile=*) out="${{arg#--outfile=}}" ;;
    --metafile=*) meta="${{arg#--metafile=}}" ;;
  esac
done
if [ {exit_code} -ne 0 ]; then
  echo "boom: could not resolve import" >&2
  exit {exit_code}
fi
printf 'export default {{ fetch() {{ return new Response("ok"); }} }};\n' > "$out"
printf '{{"outputs":{{}}}}' > "$meta"
"#
        ),
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn project() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn help_lists_flags() {
    let dir = project();
    pages_bundle(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--build-output-directory"))
        .stdout(predicate::str::contains("--bundle"));
}

#[test]
fn nothing_to_build_exits_1() {
    let dir = project();
    pages_bundle(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not find anything to build"));
    assert!(!dir.path().join("_worker.js").exists());
}

#[test]
fn functions_without_routes_exit_156_and_write_nothing() {
    let dir = project();
    fs::create_dir_all(dir.path().join("functions")).unwrap();
    fs::write(dir.path().join("functions/README.md"), "# no handlers").unwrap();

    pages_bundle(dir.path())
        .arg("--bundle")
        .assert()
        .code(156)
        .stderr(predicate::str::contains("No routes found"));

    assert!(!dir.path().join("_worker.bundle").exists());
}

#[test]
fn functions_without_routes_leave_existing_output_unchanged() {
    let dir = project();
    fs::create_dir_all(dir.path().join("functions")).unwrap();
    fs::write(
        dir.path().join("functions/index.js"),
        "// export function onRequest() {}\nexport const helper = 1;",
    )
    .unwrap();
    let previous = b"previous bundle bytes".to_vec();
    fs::write(dir.path().join("_worker.bundle"), &previous).unwrap();

    pages_bundle(dir.path())
        .arg("--bundle")
        .assert()
        .code(156);

    assert_eq!(fs::read(dir.path().join("_worker.bundle")).unwrap(), previous);
}

#[test]
fn malformed_bindings_exit_1() {
    let dir = project();
    fs::create_dir_all(dir.path().join("functions")).unwrap();
    fs::write(
        dir.path().join("functions/index.js"),
        "export const onRequest = () => new Response('hi');",
    )
    .unwrap();

    pages_bundle(dir.path())
        .args(["--bindings", "{"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bindings"));
}

#[test]
fn empty_fallback_service_is_rejected() {
    let dir = project();
    pages_bundle(dir.path())
        .args(["--fallback-service", ""])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--fallback-service"));
}

#[test]
fn invalid_config_file_exits_1() {
    let dir = project();
    fs::write(dir.path().join("pages.toml"), "[build\n").unwrap();
    pages_bundle(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pages.toml"));
}

#[cfg(unix)]
#[test]
fn bundles_raw_worker_into_multipart_payload() {
    let dir = project();
    let compiler = fake_compiler(dir.path(), 0);
    fs::create_dir_all(dir.path().join("public")).unwrap();
    fs::write(dir.path().join("public/_worker.js"), "export default {};").unwrap();
    fs::write(dir.path().join("_worker.bundle"), "x".repeat(64 * 1024)).unwrap();

    pages_bundle(dir.path())
        .args(["--build-output-directory", "public", "--bundle", "--compiler"])
        .arg(&compiler)
        .assert()
        .success();

    let payload = fs::read_to_string(dir.path().join("_worker.bundle")).unwrap();
    assert!(payload.starts_with("------PagesBundleBoundary"));
    assert!(payload.contains("name=\"metadata\""));
    assert!(payload.contains("\"main_module\":\"bundledWorker-"));
    assert!(payload.contains("return new Response(\"ok\")"));
    assert!(!payload.contains("xxxx"));
}

#[cfg(unix)]
#[test]
fn compiles_functions_and_writes_routes() {
    let dir = project();
    let compiler = fake_compiler(dir.path(), 0);
    fs::create_dir_all(dir.path().join("functions/api")).unwrap();
    fs::write(
        dir.path().join("functions/api/[id].js"),
        "export const onRequestGet = () => new Response('item');",
    )
    .unwrap();

    pages_bundle(dir.path())
        .args([
            "--outfile",
            "dist/_worker.js",
            "--output-routes-path",
            "dist/_routes.json",
            "--output-config-path",
            "dist/config.json",
            "--compiler",
        ])
        .arg(&compiler)
        .assert()
        .success();

    let worker = fs::read_to_string(dir.path().join("dist/_worker.js")).unwrap();
    assert!(worker.contains("export default"));

    let routes: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("dist/_routes.json")).unwrap())
            .unwrap();
    assert_eq!(routes["version"], 1);
    assert_eq!(routes["include"], serde_json::json!(["/api/*"]));
    assert_eq!(routes["exclude"], serde_json::json!([]));

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("dist/config.json")).unwrap())
            .unwrap();
    assert_eq!(config["routes"][0]["routePath"], "/api/:id");
    assert_eq!(config["routes"][0]["method"], "GET");
}

#[cfg(unix)]
#[test]
fn compiler_failure_is_forwarded() {
    let dir = project();
    let compiler = fake_compiler(dir.path(), 1);
    fs::create_dir_all(dir.path().join("public")).unwrap();
    fs::write(dir.path().join("public/_worker.js"), "import 'missing';").unwrap();

    pages_bundle(dir.path())
        .args(["--build-output-directory", "public", "--compiler"])
        .arg(&compiler)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("boom: could not resolve import"));
}
