//! CLI integration tests.
//!
//! These exercise the `repofetch` binary end to end while staying offline:
//! classification without recursion, pip-style git URL parsing, local
//! `file://` repositories for the resolve-then-fetch path, and the output
//! directory contract.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn repofetch() -> Command {
    Command::cargo_bin("repofetch").expect("binary builds")
}

/// Throwaway local repository with one commit on `main`.
fn local_repo(dir: &Path) -> String {
    let run = |args: &[&str]| {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    };
    run(&["init", "--initial-branch=main", "."]);
    std::fs::write(dir.join("hello.txt"), "hello repofetch").unwrap();
    run(&["add", "."]);
    run(&["commit", "-m", "initial"]);
    format!("file://{}", dir.display())
}

#[test]
fn resolve_classifies_github_urls_without_recursion() {
    repofetch()
        .args(["resolve", "--no-recurse", "https://github.com/pyOpenSci/pyos-package-template"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "MaybeExists(GitHubURL(https://github.com/, https://github.com/pyOpenSci/pyos-package-template))",
        ));
}

#[test]
fn resolve_parses_git_urls_without_touching_the_network() {
    repofetch()
        .args(["resolve", "--no-recurse", "git+https://example.com/org/repo@v1.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MaybeExists(Git(https://example.com/org/repo, v1.2))"));
}

#[test]
fn resolve_emits_canonical_json_when_asked() {
    let output = repofetch()
        .args([
            "resolve",
            "--no-recurse",
            "--json",
            "https://github.com/pyOpenSci/pyos-package-template",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let line = String::from_utf8(output).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(parsed["certainity"], "MaybeExists");
    assert_eq!(parsed["kind"], "GitHubURL");
    assert_eq!(parsed["data"]["installation"], "https://github.com/");
}

#[test]
fn resolve_reports_unresolvable_questions() {
    repofetch()
        .args(["resolve", "11529/10016"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unable to resolve 11529/10016"));
}

#[test]
fn resolve_pins_a_local_repo_to_its_sha() {
    let repo_dir = tempfile::tempdir().unwrap();
    let url = local_repo(repo_dir.path());

    repofetch()
        .args(["resolve", &format!("git+{url}")])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(&format!("MaybeExists(Git({url}, HEAD))"))
                .and(predicate::str::contains("Exists(ImmutableGit(")),
        );
}

#[test]
fn resolve_surfaces_missing_refs_as_does_not_exist() {
    let repo_dir = tempfile::tempdir().unwrap();
    let url = local_repo(repo_dir.path());

    repofetch()
        .args(["resolve", &format!("git+{url}@no-such-branch")])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DoesNotExist(ImmutableGit, No ref no-such-branch"));
}

#[test]
fn fetch_materializes_a_local_repo() {
    let repo_dir = tempfile::tempdir().unwrap();
    let url = local_repo(repo_dir.path());
    let out_dir = tempfile::tempdir().unwrap();
    let target = out_dir.path().join("clone");

    repofetch()
        .args(["fetch", &format!("git+{url}"), &target.to_string_lossy()])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(target.join("hello.txt")).unwrap(),
        "hello repofetch"
    );
}

#[test]
fn fetch_rejects_a_non_empty_output_dir() {
    let out_dir = tempfile::tempdir().unwrap();
    std::fs::write(out_dir.path().join("occupied.txt"), "here first").unwrap();

    repofetch()
        .args(["fetch", "https://github.com/a/b", &out_dir.path().to_string_lossy()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Is a non-empty directory"));

    // Nothing was written next to the existing file
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 1);
}

#[test]
fn fetch_rejects_a_file_as_output_dir() {
    let out_dir = tempfile::tempdir().unwrap();
    let file_path = out_dir.path().join("a-file");
    std::fs::write(&file_path, "x").unwrap();

    repofetch()
        .args(["fetch", "https://github.com/a/b", &file_path.to_string_lossy()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Is a file"));
}

#[test]
fn fetch_creates_a_missing_output_dir_before_resolving() {
    // The question is unresolvable, but the directory gets created first -
    // validation happens before any resolution work
    let out_dir = tempfile::tempdir().unwrap();
    let target = out_dir.path().join("fresh");

    repofetch()
        .args(["fetch", "11529/10016", &target.to_string_lossy()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to resolve"));

    assert!(target.is_dir());
}
