use std::env;
use std::process::Command;

// Release builds are stamped with their commit and refuse a dirty tree.
fn git(args: &[&str]) -> Vec<u8> {
    Command::new("git")
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("Failed to execute git {}: {}", args.join(" "), error))
        .stdout
}

fn main() {
    let package_version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());
    let is_optimized = env::var("OPT_LEVEL").map_or(false, |level| level != "0");

    let release = if is_optimized {
        if !git(&["status", "--porcelain"]).is_empty() {
            panic!("Uncommited files exist")
        }

        let commit = String::from_utf8(git(&["rev-parse", "--short", "HEAD"]))
            .expect("Invalid UTF-8 data");
        format!("{} ({})", package_version, commit.trim())
    } else {
        format!("{} (development build)", package_version)
    };

    println!("cargo:rerun-if-env-changed=OPT_LEVEL");
    println!("cargo:rustc-env=RELEASE={}", release);
}
