use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-env-changed=CAMFRAME_BUILD_DATE");

    let commit_full = env::var("GITHUB_SHA")
        .ok()
        .filter(|sha| !sha.is_empty())
        .or_else(|| run_git(&["rev-parse", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let commit_short = shorten_commit(&commit_full);

    // Reproducible builds pin the date; otherwise use the last commit date.
    let build_date = env::var("CAMFRAME_BUILD_DATE")
        .ok()
        .filter(|date| !date.is_empty())
        .or_else(|| run_git(&["log", "-1", "--format=%cs"]))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=CAMFRAME_BUILD_COMMIT={commit_short}");
    println!("cargo:rustc-env=CAMFRAME_BUILD_COMMIT_FULL={commit_full}");
    println!("cargo:rustc-env=CAMFRAME_BUILD_DATE={build_date}");
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn shorten_commit(full: &str) -> String {
    if full == "unknown" {
        return full.to_string();
    }
    full.chars().take(7).collect()
}
