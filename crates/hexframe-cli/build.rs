use std::env;
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=HEXFRAME_COMMIT");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let commit = env::var("HEXFRAME_COMMIT")
        .ok()
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(7).collect())
        .or_else(|| git(&["rev-parse", "--short=7", "HEAD"]))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let date = source_date()
        .or_else(|| git(&["log", "-1", "--format=%cI"]))
        .unwrap_or_else(|| UNKNOWN.to_string());

    println!("cargo:rustc-env=HEXFRAME_BUILD_COMMIT={commit}");
    println!("cargo:rustc-env=HEXFRAME_BUILD_DATE={date}");
}

/// Reproducible builds pin the date through `SOURCE_DATE_EPOCH`.
fn source_date() -> Option<String> {
    let secs: i64 = env::var("SOURCE_DATE_EPOCH").ok()?.trim().parse().ok()?;
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}
