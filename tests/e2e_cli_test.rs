//! E2E tests for the statcard binary.
//!
//! Covers:
//! - Help output and argument errors
//! - Exit codes for unknown sources and missing identities
//! - JSON error envelopes
//! - Config path and cache subcommands against a temp directory
//! - A full fetch against a mock scraper, then a cached re-run

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use statcard::test_utils::{TestDir, make_test_codechef_profile_json};

mod common;

use common::mount_json;

/// Binary isolated from the user's config, cache and identities.
#[allow(deprecated)]
fn statcard(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("statcard").unwrap();
    cmd.env("STATCARD_CONFIG", dir.file_path("config.toml"))
        .env("STATCARD_CACHE_DIR", dir.file_path("cache"))
        .env("NO_COLOR", "1")
        .env_remove("STATCARD_FORMAT")
        .env_remove("STATCARD_TIMEOUT")
        .env_remove("STATCARD_LOG")
        .env_remove("STATCARD_WAKATIME_IDENTITY")
        .env_remove("STATCARD_CODECHEF_IDENTITY")
        .env_remove("STATCARD_LEETCODE_IDENTITY");
    cmd
}

fn parse_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        panic!("invalid JSON ({e}): {}", String::from_utf8_lossy(bytes))
    })
}

// =============================================================================
// Arguments
// =============================================================================

#[test]
fn help_lists_subcommands() {
    let dir = TestDir::new();
    statcard(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("fetch")
                .and(predicate::str::contains("cache"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn unknown_source_exits_with_parse_code() {
    let dir = TestDir::new();
    statcard(&dir)
        .args(["fetch", "github"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("github"));
}

#[test]
fn identity_with_several_sources_is_rejected() {
    let dir = TestDir::new();
    statcard(&dir)
        .args(["fetch", "codechef", "leetcode", "--identity", "x"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--identity"));
}

#[test]
fn missing_identity_exits_with_parse_code() {
    let dir = TestDir::new();
    statcard(&dir)
        .args(["fetch", "codechef"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("codechef"));
}

#[test]
fn bare_invocation_without_identities_is_a_config_error() {
    let dir = TestDir::new();
    statcard(&dir).assert().code(3);
}

#[test]
fn json_errors_are_machine_readable() {
    let dir = TestDir::new();
    let output = statcard(&dir)
        .args(["--json", "fetch", "github"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let json = parse_json(&output.stderr);
    assert_eq!(json["exit_code"], 3);
    assert!(json["error_code"].as_str().is_some_and(|c| !c.is_empty()));
    assert!(json["message"].as_str().unwrap().contains("github"));
}

#[test]
fn malformed_config_is_reported_not_panicked() {
    let dir = TestDir::new();
    dir.create_file("config.toml", "[general\ntimeout_seconds = ");
    statcard(&dir)
        .args(["config", "show"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("panicked").not());
}

// =============================================================================
// Config and cache
// =============================================================================

#[test]
fn config_path_honors_override() {
    let dir = TestDir::new();
    statcard(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show_reports_identity_origin() {
    let dir = TestDir::new();
    dir.create_file(
        "config.toml",
        "[sources.leetcode]\nidentity = \"coder\"\n",
    );
    let output = statcard(&dir)
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["command"], "config");
    assert_eq!(json["data"]["sources"]["leetcode"]["identity"], "coder");
}

#[test]
fn empty_cache_lists_nothing() {
    let dir = TestDir::new();
    statcard(&dir)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached entries."));
}

#[test]
fn explicit_format_overrides_env_format() {
    let dir = TestDir::new();
    statcard(&dir)
        .env("STATCARD_FORMAT", "json")
        .args(["--format", "md", "cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached entries."));
}

#[test]
fn cache_clear_counts_removed_entries() {
    let dir = TestDir::new();
    dir.create_file(
        "cache/records/codechef_data_chef.json",
        r#"{"data":{"stars":"3★"},"timestamp":1}"#,
    );
    statcard(&dir)
        .args(["cache", "clear", "codechef"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cached entry"));
}

// =============================================================================
// Fetching
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn fetch_then_serve_from_cache() {
    let server = wiremock::MockServer::start().await;
    mount_json(&server, "/profile/chef", 200, make_test_codechef_profile_json(), 1).await;

    let dir = TestDir::new();
    dir.create_file(
        "config.toml",
        &format!(
            r#"[sources.codechef]
identity = "chef"

[sources.codechef.endpoints.profile]
primary = "{uri}/profile/{{identity}}"
fallback = ""

[sources.codechef.endpoints.recent]
primary = ""
fallback = ""
"#,
            uri = server.uri()
        ),
    );

    let first = statcard(&dir).args(["--json", "fetch", "codechef"]).output().unwrap();
    assert!(
        first.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    let json = parse_json(&first.stdout);
    assert_eq!(json["command"], "fetch");
    assert_eq!(json["data"][0]["source"], "codechef");
    assert_eq!(json["data"][0]["origin"], "network");
    assert_eq!(json["data"][0]["data"]["rating"], 1650.0);

    // Second run is inside the TTL, so the mock's single expectation holds.
    let second = statcard(&dir).args(["--json", "fetch", "codechef"]).output().unwrap();
    assert!(second.status.success());
    let json = parse_json(&second.stdout);
    assert_eq!(json["data"][0]["origin"], "fresh-cache");

    statcard(&dir)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("codechef_data_chef"));
}

#[tokio::test(flavor = "multi_thread")]
async fn human_output_for_unreachable_source_reports_failure() {
    let server = wiremock::MockServer::start().await;
    let dir = TestDir::new();
    dir.create_file(
        "config.toml",
        &format!(
            "[sources.leetcode]\nidentity = \"coder\"\n\n\
             [sources.leetcode.endpoints.profile]\nprimary = \"{uri}/missing/{{identity}}\"\nfallback = \"\"\n",
            uri = server.uri()
        ),
    );

    statcard(&dir)
        .args(["fetch", "leetcode"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to load LeetCode stats"));
}
