use std::fs;
use std::process::Command;

use crate::error::{Error, Result};

fn run(program: &str, args: &[&str]) -> Result<()> {
    let rendered = format!("{} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| Error::ExternalCommandFailure {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(Error::ExternalCommandFailure {
            command: rendered,
            reason: format!("exit status {}", status),
        });
    }
    Ok(())
}

pub fn enable_persistent(identity: &str) -> Result<()> {
    run("systemctl", &["enable", &format!("wg-quick@{}", identity)])
}

pub fn disable_persistent(identity: &str) -> Result<()> {
    run("systemctl", &["disable", &format!("wg-quick@{}", identity)])
}

pub fn start(identity: &str) -> Result<()> {
    run("systemctl", &["start", &format!("wg-quick@{}", identity)])
}

pub fn stop(identity: &str) -> Result<()> {
    run("systemctl", &["stop", &format!("wg-quick@{}", identity)])
}

/// Bring the tunnel up directly, outside the service manager.
pub fn up(identity: &str) -> Result<()> {
    run("wg-quick", &["up", identity])
}

pub fn down(identity: &str) -> Result<()> {
    run("wg-quick", &["down", identity])
}

/**
 * @brief Pick the uplink interface for the MASQUERADE rules.
 *
 * Loopback, docker bridges and the wg interfaces themselves are skipped;
 * falls back to eth0 when nothing else is visible.
 *
 * @param preferred Override from the settings file, returned as-is.
 */
pub fn detect_uplink(preferred: Option<&str>) -> String {
    if let Some(name) = preferred {
        return name.to_string();
    }
    if let Ok(entries) = fs::read_dir("/sys/class/net") {
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        for name in names {
            if name == "lo" || name.starts_with("docker") || name.starts_with("wg") {
                continue;
            }
            return name;
        }
    }
    "eth0".to_string()
}
