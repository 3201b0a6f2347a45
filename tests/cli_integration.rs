//! Integration tests for the apivault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Secret values are piped through stdin (or given inline) so no
//! interactive prompt is ever reached.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const TEST_KEY_ENV: &str = "APIVAULT_CLI_TEST_KEY";

/// Helper: get a Command pointing at the apivault binary.
#[allow(deprecated)]
fn bin() -> Command {
    Command::cargo_bin("apivault").expect("binary should exist")
}

/// Helper: the binary configured with a zero master key and a database
/// inside `dir`.
fn apivault(dir: &TempDir) -> Command {
    let mut cmd = bin();
    cmd.current_dir(dir.path())
        .env(TEST_KEY_ENV, "00".repeat(32))
        .env_remove("APIVAULT_DB")
        .env_remove("RUST_LOG")
        .args(["--key-env", TEST_KEY_ENV]);
    cmd
}

/// Register a value through stdin and return the printed record id.
fn register(dir: &TempDir, key_name: &str, value: &str) -> String {
    let output = apivault(dir)
        .args(["register", key_name])
        .write_stdin(value)
        .output()
        .expect("run register");
    assert!(output.status.success(), "register failed: {output:?}");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn help_flag_shows_usage() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Encrypted storage for third-party API credentials",
        ))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("reveal"))
        .stdout(predicate::str::contains("deactivate"))
        .stdout(predicate::str::contains("set-default"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("keygen"));
}

#[test]
fn no_args_shows_help() {
    bin()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn keygen_prints_64_hex_chars() {
    let tmp = TempDir::new().unwrap();
    apivault(&tmp)
        .arg("keygen")
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap());
}

#[test]
fn missing_master_key_is_fatal() {
    let tmp = TempDir::new().unwrap();
    apivault(&tmp)
        .env_remove(TEST_KEY_ENV)
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(TEST_KEY_ENV));

    // Nothing was created without a valid key.
    assert!(!tmp.path().join(".apivault").exists());
}

#[test]
fn short_master_key_is_fatal() {
    let tmp = TempDir::new().unwrap();
    apivault(&tmp)
        .env(TEST_KEY_ENV, "abcd")
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("32 bytes"));
}

#[test]
fn register_then_reveal_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let id = register(&tmp, "GEMINI_API_KEY", "sk-test-123");
    assert!(!id.is_empty());

    apivault(&tmp)
        .args(["reveal", &id])
        .assert()
        .success()
        .stdout("sk-test-123\n");

    apivault(&tmp)
        .args(["reveal-default", "GEMINI_API_KEY"])
        .assert()
        .success()
        .stdout("sk-test-123\n");

    // Rotation keeps the id.
    let rotated = register(&tmp, "GEMINI_API_KEY", "sk-test-456");
    assert_eq!(rotated, id);
    apivault(&tmp)
        .args(["reveal", &id])
        .assert()
        .success()
        .stdout("sk-test-456\n");
}

#[test]
fn deactivate_blocks_reveal_but_keeps_listing() {
    let tmp = TempDir::new().unwrap();
    let id = register(&tmp, "OPENAI_API_KEY", "sk-abc");

    apivault(&tmp)
        .args(["deactivate", &id, "--force"])
        .assert()
        .success();

    apivault(&tmp)
        .args(["reveal", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inactive"));

    apivault(&tmp)
        .args(["list", "OPENAI_API_KEY", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("\"is_active\": false"))
        .stdout(predicate::str::contains("sk-abc").not());
}

#[test]
fn database_never_contains_plaintext() {
    let tmp = TempDir::new().unwrap();
    register(&tmp, "STRIPE_SECRET_KEY", "sk_live_very_secret_value");

    // Check the main file and any WAL/SHM side files.
    let needle = b"sk_live_very_secret_value";
    for entry in std::fs::read_dir(tmp.path().join(".apivault")).unwrap() {
        let bytes = std::fs::read(entry.unwrap().path()).unwrap();
        assert!(!bytes.windows(needle.len()).any(|w| w == needle));
    }
}

#[test]
fn reveal_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    apivault(&tmp)
        .args(["reveal", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn audit_lists_mutations() {
    let tmp = TempDir::new().unwrap();
    let id = register(&tmp, "KEY", "one");
    register(&tmp, "KEY", "two");
    apivault(&tmp)
        .args(["deactivate", &id, "--force"])
        .assert()
        .success();

    apivault(&tmp)
        .args(["audit", "--last", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("rotate"))
        .stdout(predicate::str::contains("deactivate"));
}

#[test]
fn config_file_sets_database_path() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(".apivault.toml"),
        "database_path = \"data/custom.db\"\n",
    )
    .unwrap();

    register(&tmp, "KEY", "value");
    assert!(tmp.path().join("data").join("custom.db").exists());
}

#[test]
fn update_keeps_fields_that_are_not_given() {
    let tmp = TempDir::new().unwrap();
    let output = apivault(&tmp)
        .args(["register", "GEMINI_API_KEY", "--service", "gemini", "--type", "api_key"])
        .write_stdin("sk-1")
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap().trim().to_string();

    apivault(&tmp)
        .args(["update", &id, "--label", "Staging"])
        .assert()
        .success();

    apivault(&tmp)
        .args(["list", "GEMINI_API_KEY", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key_label\": \"Staging\""))
        .stdout(predicate::str::contains("\"service_name\": \"gemini\""))
        .stdout(predicate::str::contains("\"key_type\": \"api_key\""));
}
