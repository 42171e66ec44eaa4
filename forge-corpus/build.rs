//! Embeds build identification for the startup banner
//!
//! `FORGE_GIT_DESCRIBE`: `git describe --always --dirty`, or `unknown` outside
//! a checkout. `FORGE_BUILD_TIMESTAMP`: RFC 3339, taken from
//! `SOURCE_DATE_EPOCH` when set. `FORGE_BUILD_PROFILE`: cargo profile.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn main() {
    let describe = git(&["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| "unknown".to_string());
    let timestamp = build_time().to_rfc3339_opts(SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=FORGE_GIT_DESCRIBE={}", describe);
    println!("cargo:rustc-env=FORGE_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=FORGE_BUILD_PROFILE={}", profile);

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    if let Some(git_dir) = git(&["rev-parse", "--git-dir"]) {
        let head = Path::new(&git_dir).join("HEAD");
        println!("cargo:rerun-if-changed={}", head.display());
        if let Some(branch) = git(&["symbolic-ref", "-q", "HEAD"]) {
            println!("cargo:rerun-if-changed={}", Path::new(&git_dir).join(branch).display());
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
}
