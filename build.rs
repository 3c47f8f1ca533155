// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packagers can pin the version string
    let version = if let Ok(v) = std::env::var("AMMS_IMAGING_VERSION") {
        v
    } else {
        get_git_version()
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn get_git_version() -> String {
    let pkg_version = env!("CARGO_PKG_VERSION").to_string();

    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if described.starts_with('v') {
                described.trim_start_matches('v').to_string()
            } else {
                // No tag yet, only a commit hash
                format!("{}-{}", pkg_version, described)
            }
        }
        _ => pkg_version,
    }
}
