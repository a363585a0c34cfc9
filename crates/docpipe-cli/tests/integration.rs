use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn docpipe(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docpipe").unwrap();
    cmd.current_dir(dir.path()).env("DOCPIPE_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    docpipe(dir).arg("init").assert().success();
}

fn refine(dir: &TempDir, name: &str, description: &str) {
    docpipe(dir)
        .args([
            "refine-requirements",
            name,
            "--description",
            description,
            "--no-input",
        ])
        .assert()
        .success();
}

const LOGIN_DESC: &str =
    "Users must log in with a password. The system must store every action taken. \
     Users should export reports of recent activity.";

// ---------------------------------------------------------------------------
// docpipe init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    docpipe(&dir).arg("init").assert().success();

    assert!(dir.path().join(".docpipe").is_dir());
    assert!(dir.path().join(".docpipe/config.yaml").exists());
    assert!(dir.path().join(".docpipe/pipelines").is_dir());
    assert!(dir.path().join("docs/requirements").is_dir());
    assert!(dir.path().join("docs/architecture").is_dir());
    assert!(dir.path().join("docs/specifications").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    docpipe(&dir).arg("init").assert().success();
    docpipe(&dir).arg("init").assert().success();
}

#[test]
fn init_preserves_edited_config() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let config_path = dir.path().join(".docpipe/config.yaml");
    let edited = std::fs::read_to_string(&config_path)
        .unwrap()
        .replace("max_clarifying: 5", "max_clarifying: 3");
    std::fs::write(&config_path, edited).unwrap();

    docpipe(&dir).arg("init").assert().success();
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("max_clarifying: 3"));
}

// ---------------------------------------------------------------------------
// docpipe refine-requirements
// ---------------------------------------------------------------------------

#[test]
fn refine_derives_slug_and_writes_document() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    refine(&dir, "User Login", LOGIN_DESC);

    let path = dir.path().join("docs/requirements/user-login.md");
    assert!(path.exists());

    let content = std::fs::read_to_string(&path).unwrap();
    for section in [
        "## Overview",
        "## Functional Requirements",
        "## Non-Functional Requirements",
        "## Constraints",
        "## Assumptions",
        "## Open Questions",
    ] {
        assert!(content.contains(section), "missing {section}");
    }
    assert!(content.contains("### FR-1:"));
}

#[test]
fn refine_empty_name_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args(["refine-requirements", "!!!", "--no-input"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty slug"));
}

#[test]
fn refine_before_init_fails_with_guidance() {
    let dir = TempDir::new().unwrap();

    docpipe(&dir)
        .args(["refine-requirements", "Thing", "--no-input"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("docpipe init"));
}

#[test]
fn refine_answer_flag_becomes_assumption() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args([
            "refine-requirements",
            "Exports",
            "--description",
            "Users must export reports.",
            "--answer",
            "Finance analysts",
        ])
        .assert()
        .success();

    let content =
        std::fs::read_to_string(dir.path().join("docs/requirements/exports.md")).unwrap();
    assert!(content.contains("Finance analysts"));
}

#[test]
fn refine_rerun_replaces_document_completely() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    refine(&dir, "Thing", "The system must export reports nightly.");
    refine(&dir, "Thing", "The system must do one small thing.");

    let content = std::fs::read_to_string(dir.path().join("docs/requirements/thing.md")).unwrap();
    assert!(!content.contains("export reports"));
    assert!(content.contains("### FR-1:"));
    assert!(!content.contains("### FR-2:"));
}

// ---------------------------------------------------------------------------
// docpipe design-architecture
// ---------------------------------------------------------------------------

#[test]
fn design_without_requirements_fails_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args(["design-architecture", "ghost", "--no-input"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refine-requirements"));

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("docs/architecture"))
        .unwrap()
        .collect();
    assert!(entries.is_empty());
}

#[test]
fn design_references_requirements_and_traces_every_fr() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    refine(&dir, "User Login", LOGIN_DESC);

    docpipe(&dir)
        .args(["design-architecture", "user-login", "--no-input"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MODULE"));

    let arch =
        std::fs::read_to_string(dir.path().join("docs/architecture/user-login.md")).unwrap();
    assert!(arch.contains("docs/requirements/user-login.md"));

    let req = std::fs::read_to_string(dir.path().join("docs/requirements/user-login.md")).unwrap();
    for id in fr_ids(&req) {
        assert!(arch.contains(&format!("| {id} |")), "{id} missing from traceability");
    }
}

// ---------------------------------------------------------------------------
// docpipe specify
// ---------------------------------------------------------------------------

#[test]
fn specify_without_architecture_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args(["specify", "ghost", "--no-input"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("design-architecture"));
}

#[test]
fn specify_emits_expected_file_counts() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    refine(&dir, "User Login", LOGIN_DESC);
    docpipe(&dir)
        .args(["design-architecture", "user-login", "--no-input"])
        .assert()
        .success();
    docpipe(&dir)
        .args(["specify", "user-login", "--no-input"])
        .assert()
        .success();

    let bundle = dir.path().join("docs/specifications/user-login");
    assert!(bundle.join("README.md").exists());

    // Three modules, exactly one of them stateful.
    assert_eq!(count_files(&bundle.join("contracts")), 3);
    assert_eq!(count_files(&bundle.join("properties")), 1);
    assert!(count_files(&bundle.join("behaviors")) >= 1);
}

#[test]
fn specify_readme_contains_full_traceability() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    refine(&dir, "User Login", LOGIN_DESC);
    docpipe(&dir)
        .args(["design-architecture", "user-login", "--no-input"])
        .assert()
        .success();
    docpipe(&dir)
        .args(["specify", "user-login", "--no-input"])
        .assert()
        .success();

    let req = std::fs::read_to_string(dir.path().join("docs/requirements/user-login.md")).unwrap();
    let readme =
        std::fs::read_to_string(dir.path().join("docs/specifications/user-login/README.md"))
            .unwrap();
    let ids = fr_ids(&req);
    assert!(!ids.is_empty());
    for id in ids {
        assert!(readme.contains(&format!("| {id} |")), "{id} missing from matrix");
    }
}

// ---------------------------------------------------------------------------
// docpipe implement-functional / review-functional / status
// ---------------------------------------------------------------------------

fn full_pipeline(dir: &TempDir) {
    init_project(dir);
    refine(dir, "User Login", LOGIN_DESC);
    for step in [
        vec!["design-architecture", "user-login", "--no-input"],
        vec!["specify", "user-login", "--no-input"],
        vec!["implement-functional", "user-login", "--no-input"],
    ] {
        docpipe(dir).args(&step).assert().success();
    }
}

#[test]
fn implement_without_bundle_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args(["implement-functional", "ghost", "--no-input"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("specify"));
}

#[test]
fn full_pipeline_emits_source_stubs() {
    let dir = TempDir::new().unwrap();
    full_pipeline(&dir);

    let pkg = dir.path().join("src/main/kotlin/com/example/app");
    assert!(pkg.join("Storage.kt").exists());
    assert!(pkg.join("StorageRecord.kt").exists());
    assert!(pkg.join("AccessControl.kt").exists());

    let storage = std::fs::read_to_string(pkg.join("Storage.kt")).unwrap();
    assert!(storage.contains("package com.example.app"));
    assert!(storage.contains("interface Storage"));
}

#[test]
fn review_clean_after_full_pipeline() {
    let dir = TempDir::new().unwrap();
    full_pipeline(&dir);

    docpipe(&dir)
        .args(["review-functional", "user-login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn review_flags_stale_downstream_after_requirements_rerun() {
    let dir = TempDir::new().unwrap();
    full_pipeline(&dir);

    std::thread::sleep(std::time::Duration::from_millis(10));
    refine(&dir, "User Login", LOGIN_DESC);

    docpipe(&dir)
        .args(["review-functional", "user-login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("predates"));
}

#[test]
fn status_lists_pipeline_state() {
    let dir = TempDir::new().unwrap();
    full_pipeline(&dir);

    docpipe(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("user-login"))
        .stdout(predicate::str::contains("implemented"));
}

#[test]
fn status_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    full_pipeline(&dir);

    let output = docpipe(&dir)
        .args(["status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed[0]["slug"], "user-login");
    assert_eq!(parsed[0]["state"], "implemented");
}

#[test]
fn status_for_unknown_slug_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    docpipe(&dir)
        .args(["status", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pipeline recorded"));
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fr_ids(requirements_md: &str) -> Vec<String> {
    requirements_md
        .lines()
        .filter_map(|l| l.strip_prefix("### FR-"))
        .filter_map(|rest| rest.split(':').next())
        .map(|n| format!("FR-{n}"))
        .collect()
}

fn count_files(dir: &std::path::Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir).unwrap().count()
}
