//! Captures build identity at compile time.
//!
//! `RUSTC_VERSION` is always set (possibly empty). `GIT_COMMIT` and
//! `BUILD_DATE` are injected by the build environment, the same way a CI
//! pipeline would pass linker flags; absent values surface as empty strings
//! in the /whoami response rather than failing the build.

use std::process::Command;

fn main() {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_owned());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_owned())
        .unwrap_or_default();
    println!("cargo:rustc-env=RUSTC_VERSION={version}");

    println!("cargo:rerun-if-env-changed=RUSTC");
    println!("cargo:rerun-if-env-changed=GIT_COMMIT");
    println!("cargo:rerun-if-env-changed=BUILD_DATE");
}
