//! Binary-level tests for argument handling and failure exit codes

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use tempfile::TempDir;

const APP: &str = "a47ac10b-58cc-4372-a567-0e02b2c3d470";

/// A cloudctl command isolated from the caller's home, .env and environment
fn cloudctl(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cloudctl").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("CLOUDCTL_CONFIG")
        .env_remove("CLOUDCTL_API_URL")
        .env_remove("CLOUDCTL_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// An address nothing listens on
fn closed_api_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A canned API: one environment and a small archive for php-error
fn serve_download_api() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut socket) = stream else { break };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let head = String::from_utf8_lossy(&head).to_string();

            let (status, content_type, body): (&str, &str, &[u8]) =
                if head.starts_with(&format!("GET /applications/{}/environments ", APP)) {
                    (
                        "200 OK",
                        "application/json",
                        &br#"{"_embedded":{"items":[{"id":"24-a47ac10b","label":"Production","name":"prod"}]}}"#[..],
                    )
                } else if head.starts_with("GET /environments/24-a47ac10b/logs/php-error/download ") {
                    ("200 OK", "application/octet-stream", &[0x1f, 0x8b, 0x08, 0x00][..])
                } else {
                    ("404 Not Found", "application/json", &br#"{"message":"not found"}"#[..])
                };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                content_type,
                body.len()
            );
            let _ = socket.write_all(response.as_bytes());
            let _ = socket.write_all(body);
            let _ = socket.flush();
        }
    });

    format!("http://{}", addr)
}

#[test]
fn test_help_lists_log_commands() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("log:list"))
        .stdout(predicate::str::contains("log:stream"))
        .stdout(predicate::str::contains("log:snapshot"))
        .stdout(predicate::str::contains("log:download"));
}

#[test]
fn test_stream_help_shows_filters() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["log:stream", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--colourise"))
        .stdout(predicate::str::contains("--logtypes"))
        .stdout(predicate::str::contains("--servers"));
}

#[test]
fn test_invalid_uuid_is_rejected() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["log:list", "not-a-uuid", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-uuid"));
}

#[test]
fn test_invalid_log_type_is_rejected() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["log:download", APP, "prod", "../../etc/passwd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log type"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["--config", "does-not-exist.toml", "log:list", APP, "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("cloudctl.toml");
    std::fs::write(&config, "[stream]\nidle_timeout_secs = 0\n").unwrap();

    cloudctl(&home)
        .arg("--config")
        .arg(&config)
        .args(["log:list", APP, "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("✗"));
}

#[test]
fn test_unreachable_api_exits_with_failure() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["--api-url", &closed_api_url(), "log:list", APP, "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Remote API error"));
}

#[test]
fn test_unreachable_api_fails_stream_before_connecting() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .env("CLOUDCTL_API_URL", closed_api_url())
        .args(["log:stream", APP, "prod", "-t", "php-error"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Remote API error"));
}

#[test]
fn test_download_help_states_destination_rule() {
    let home = TempDir::new().unwrap();
    cloudctl(&home)
        .args(["log:download", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("An existing directory receives"))
        .stdout(predicate::str::contains("<env>-<type>.tar.gz"))
        .stdout(predicate::str::contains("prefix"));
}

#[test]
fn test_download_to_directory() {
    let home = TempDir::new().unwrap();
    let dest = home.path().join("archives");
    std::fs::create_dir(&dest).unwrap();

    cloudctl(&home)
        .args(["--api-url", &serve_download_api(), "log:download", APP, "prod", "php-error"])
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("prod-php-error.tar.gz"));

    let written = std::fs::read(dest.join("prod-php-error.tar.gz")).unwrap();
    assert_eq!(written, [0x1f, 0x8b, 0x08, 0x00]);
}

#[test]
fn test_failed_download_reports_one_error() {
    let home = TempDir::new().unwrap();
    let blocker = home.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    cloudctl(&home)
        .args(["--api-url", &serve_download_api(), "log:download", APP, "prod", "php-error"])
        .arg(blocker.join(""))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to download log."))
        .stderr(predicate::function(|err: &str| err.matches('✗').count() == 1));
}
