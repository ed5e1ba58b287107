//! Build script for orche-server
//!
//! Exports the hyper version resolved in `Cargo.lock` as
//! `ORCHE_HYPER_VERSION`, so the engine version gate checks the crate that
//! is actually linked.

use std::env;
use std::path::{Path, PathBuf};

/// Used when no lock file can be found, e.g. when vendored without one.
const DECLARED_HYPER: &str = "1.6.0";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let version = match find_lock_file().map(|path| (locked_hyper(&path), path)) {
        Some((Some(version), path)) => {
            println!("cargo:rerun-if-changed={}", path.display());
            version
        }
        Some((None, path)) => {
            println!("cargo:rerun-if-changed={}", path.display());
            println!("cargo:warning=hyper not found in {}, assuming {DECLARED_HYPER}", path.display());
            DECLARED_HYPER.to_string()
        }
        None => {
            println!("cargo:warning=Cargo.lock not found, assuming hyper {DECLARED_HYPER}");
            DECLARED_HYPER.to_string()
        }
    };

    println!("cargo:rustc-env=ORCHE_HYPER_VERSION={version}");
}

/// Searches upwards from the manifest and the output directory.
///
/// A dependency built from the registry has its lock file next to the
/// consuming workspace, which is an ancestor of `OUT_DIR` but not of the
/// manifest.
fn find_lock_file() -> Option<PathBuf> {
    ["CARGO_MANIFEST_DIR", "OUT_DIR"]
        .into_iter()
        .filter_map(|var| env::var_os(var).map(PathBuf::from))
        .find_map(|start| {
            start
                .ancestors()
                .map(|dir| dir.join("Cargo.lock"))
                .find(|candidate| candidate.is_file())
        })
}

/// Returns the highest locked `1.x` hyper, if any.
fn locked_hyper(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let lock: toml::Table = text.parse().ok()?;
    let packages = lock.get("package")?.as_array()?;

    packages
        .iter()
        .filter_map(toml::Value::as_table)
        .filter(|package| package.get("name").and_then(toml::Value::as_str) == Some("hyper"))
        .filter_map(|package| package.get("version").and_then(toml::Value::as_str))
        .filter_map(|version| semver::Version::parse(version).ok())
        .filter(|version| version.major == 1)
        .max()
        .map(|version| version.to_string())
}
