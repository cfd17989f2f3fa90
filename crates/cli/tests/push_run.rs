//! End-to-end tests for the `txpush` binary.
//!
//! Each test builds a throwaway git repository with a `.tx/config`, points
//! the binary at a shell script standing in for the Transifex client, and
//! checks the exit status plus what the fake `tx` and webhook received.
//!
//! Unix only: the fake `tx` is a `/bin/sh` script.

#![cfg(unix)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;

use git2::{IndexAddOption, Repository, Signature};
use tempfile::TempDir;

// ===========================================================================
// Helpers
// ===========================================================================

const TX_CONFIG: &str = "\
[main]
host = https://app.transifex.com

[o:acme:p:web:r:messages]
file_filter = locales/<lang>.json
source_file = locales/en.json
source_lang = en

[o:acme:p:web:r:emails]
source_file = emails/en.json
source_lang = en
";

fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@test.com").unwrap();
    let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap();
}

/// A repository whose last commit edits `locales/en.json` only.
fn create_repo(dir: &Path) -> PathBuf {
    let repo_dir = dir.join("repo");
    let repo = Repository::init(&repo_dir).unwrap();
    std::fs::create_dir_all(repo_dir.join(".tx")).unwrap();
    std::fs::create_dir_all(repo_dir.join("locales")).unwrap();
    std::fs::create_dir_all(repo_dir.join("emails")).unwrap();
    std::fs::write(repo_dir.join(".tx/config"), TX_CONFIG).unwrap();
    std::fs::write(repo_dir.join("locales/en.json"), "{\n  \"greeting\": \"Hello\"\n}\n").unwrap();
    std::fs::write(repo_dir.join("emails/en.json"), "{\n  \"subject\": \"Welcome\"\n}\n").unwrap();
    commit_all(&repo, "initial");

    std::fs::write(repo_dir.join("locales/en.json"), "{\n  \"greeting\": \"Hi there\"\n}\n").unwrap();
    commit_all(&repo, "reword greeting");
    repo_dir
}

/// A fake `tx` that appends its arguments to `calls.log` and exits with
/// `exit_code`.
fn fake_tx(dir: &Path, exit_code: i32) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;
    let log = dir.join("calls.log");
    let script = dir.join("fake-tx");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\necho 'Pushing source file'\nexit {}\n",
            log.display(),
            exit_code
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (script, log)
}

fn txpush(repo: &Path, tx: &Path, webhook: Option<&str>, extra: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_txpush"));
    cmd.arg("--repo")
        .arg(repo)
        .arg("--tx-binary")
        .arg(tx)
        .args(extra)
        .env_remove("INPUT_SINCE_COMMIT")
        .env_remove("SLACK_WEBHOOK_URL");
    if let Some(url) = webhook {
        cmd.env("SLACK_WEBHOOK_URL", url);
    }
    cmd.output().expect("failed to run txpush")
}

fn calls(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Serve one webhook request with 200 OK and return its body.
fn webhook_server() -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let len = text[..split]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= split + 4 + len {
                    sock.write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                        .unwrap();
                    return text[split + 4..].to_string();
                }
            }
            if n == 0 {
                return String::new();
            }
        }
    });
    (url, handle)
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_changed_resource_is_pushed_without_webhook() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, log) = fake_tx(dir.path(), 0);

    let output = txpush(&repo, &tx, None, &[]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(calls(&log), vec!["push web.messages"]);
}

#[test]
fn test_notification_lists_pushed_resource() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, _log) = fake_tx(dir.path(), 0);
    let (url, server) = webhook_server();

    let output = txpush(&repo, &tx, Some(&url), &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let body: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    let fields = body["attachments"][0]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["title"], "messages");
    let value = fields[0]["value"].as_str().unwrap();
    assert!(value.contains("-  \"greeting\": \"Hello\""));
    assert!(value.contains("+  \"greeting\": \"Hi there\""));
}

#[test]
fn test_unchanged_resources_are_not_pushed() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, log) = fake_tx(dir.path(), 0);
    let (url, server) = webhook_server();

    // HEAD against itself: nothing changed.
    let output = txpush(&repo, &tx, Some(&url), &["--since-commit", "HEAD"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(calls(&log).is_empty());

    let body: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    assert_eq!(body["attachments"][0]["fields"].as_array().unwrap().len(), 0);
}

#[test]
fn test_push_failure_exits_nonzero_without_notifying() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, log) = fake_tx(dir.path(), 1);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());

    let output = txpush(&repo, &tx, Some(&url), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    assert_eq!(calls(&log), vec!["push web.messages"]);
    assert_eq!(
        listener.accept().map(|_| ()).unwrap_err().kind(),
        std::io::ErrorKind::WouldBlock
    );
}

#[test]
fn test_malformed_tx_config_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    std::fs::write(repo.join(".tx/config"), "[main\nhost = x\n").unwrap();
    let (tx, log) = fake_tx(dir.path(), 0);

    let output = txpush(&repo, &tx, None, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("parse error"));
    assert!(calls(&log).is_empty());
}

#[test]
fn test_dry_run_does_not_invoke_tx() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, log) = fake_tx(dir.path(), 0);

    let output = txpush(&repo, &tx, None, &["--dry-run"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(calls(&log).is_empty());
}

#[test]
fn test_resources_json() {
    let dir = TempDir::new().unwrap();
    let repo = create_repo(dir.path());
    let (tx, _log) = fake_tx(dir.path(), 0);

    let output = txpush(&repo, &tx, None, &["resources", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let resources: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let resources = resources.as_array().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0]["parsed"]["project"], "web");
    assert_eq!(resources[1]["source_file"], "emails/en.json");
}
