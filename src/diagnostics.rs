//! Environment checks for `camnode check`.
//!
//! Verifies that the capture and transcode binaries are installed, the work
//! directory is writable and the coordinator is reachable.

use crate::config::Config;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of a single check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Check passed; the string says what was found
    Ok(String),
    /// Required piece is missing
    NotFound,
    /// Present but unusable right now
    Warning(String),
}

impl CheckResult {
    fn is_ok(&self) -> bool {
        matches!(self, CheckResult::Ok(_))
    }
}

/// Locate `program` the way process launch does: as given if it contains a
/// path separator, otherwise in each `PATH` entry.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Check that a program can be found.
pub fn check_program(program: &str) -> CheckResult {
    match find_program(program) {
        Some(path) => CheckResult::Ok(path.display().to_string()),
        None => CheckResult::NotFound,
    }
}

/// Check that the work directory exists (or can be created) and is writable.
pub fn check_work_dir(dir: &Path) -> CheckResult {
    if let Err(e) = std::fs::create_dir_all(dir) {
        return CheckResult::Warning(format!("cannot create {}: {}", dir.display(), e));
    }
    let probe = dir.join(".camnode-write-check");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            std::fs::remove_file(&probe).ok();
            CheckResult::Ok(dir.display().to_string())
        }
        Err(e) => CheckResult::Warning(format!("{} is not writable: {}", dir.display(), e)),
    }
}

/// Try one TCP connection to the coordinator.
pub async fn check_coordinator(host: &str, port: u16) -> CheckResult {
    let address = format!("{}:{}", host, port);
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&address)).await {
        Ok(Ok(_)) => CheckResult::Ok(address),
        Ok(Err(e)) => CheckResult::Warning(format!("{}: {}", address, e)),
        Err(_) => CheckResult::Warning(format!("{}: timed out", address)),
    }
}

fn report(label: &str, result: &CheckResult, hint: &str) {
    print!("{:<14} ", format!("{}:", label));
    match result {
        CheckResult::Ok(detail) => println!("{} {}", "✓ OK".green(), detail.dimmed()),
        CheckResult::NotFound => {
            println!("{}", "✗ NOT FOUND".red());
            if !hint.is_empty() {
                println!("  {}", hint);
            }
        }
        CheckResult::Warning(msg) => println!("{} {}", "⚠ WARNING".yellow(), msg),
    }
}

/// Run all checks and print results. Returns `true` when everything passed.
pub async fn check_environment(config: &Config) -> bool {
    println!("Checking camnode environment...\n");

    let capture = check_program(&config.capture.program);
    report(
        "capture",
        &capture,
        "Install the camera tools (raspivid) or set capture.program",
    );

    let transcode = check_program(&config.transcode.program);
    report(
        "transcode",
        &transcode,
        "Install libav-tools (avconv) or set transcode.program",
    );

    let work_dir = check_work_dir(&config.storage.work_dir);
    report("work dir", &work_dir, "");

    let coordinator = check_coordinator(&config.server.host, config.server.port).await;
    report("coordinator", &coordinator, "");

    let all_ok = [&capture, &transcode, &work_dir, &coordinator]
        .iter()
        .all(|result| result.is_ok());

    println!();
    if all_ok {
        println!("{}", "✓ Ready to record.".green());
    } else {
        println!(
            "{}",
            "⚠ Some checks failed; recording cycles may not complete.".yellow()
        );
    }
    all_ok
}
