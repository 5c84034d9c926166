//! Checks that a Java runtime able to run the patcher is installed.

use std::{ffi::OsStr, process::Command};

use log::{debug, error};

#[cfg(windows)]
const JAVA_EXE_PATH: &str = "java.exe";

#[cfg(not(windows))]
const JAVA_EXE_PATH: &str = "java";

// Versions of the runtime the patcher is known to run on.
const SUPPORTED_VERSIONS: [&str; 2] = ["17", "20"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JavaStatus {
    /// The check was not carried out as this is a dry run.
    Skipped,
    Available,
    /// Java ran, but failed or is not a supported runtime. Contains the output of `java -version`.
    UnsupportedRuntime(String),
    /// No Java executable could be invoked.
    NotFound,
}

/// Inspects the output of `java -version`.
/// NB: This is a plain substring match: any `17` or `20` in the output is accepted as a supported version.
pub fn evaluate_version_output(output: String) -> JavaStatus {
    if output.contains("Runtime Environment")
        && SUPPORTED_VERSIONS.iter().any(|version| output.contains(version))
    {
        JavaStatus::Available
    } else {
        JavaStatus::UnsupportedRuntime(output)
    }
}

fn check_java_executable(exe_path: impl AsRef<OsStr>) -> JavaStatus {
    let output = match Command::new(exe_path).arg("-version").output() {
        Ok(output) => output,
        Err(err) => {
            debug!("Failed to invoke Java: {err}");
            return JavaStatus::NotFound;
        }
    };

    // java -version prints to stderr.
    // The whole output is matched: nothing is trimmed from either end beforehand.
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    if output.status.success() {
        evaluate_version_output(combined)
    } else {
        JavaStatus::UnsupportedRuntime(combined)
    }
}

/// Checks whether Java 17 or above is installed.
/// No process is invoked if `dry_run` is true.
pub fn check_java(dry_run: bool) -> JavaStatus {
    if dry_run {
        return JavaStatus::Skipped;
    }

    check_java_executable(JAVA_EXE_PATH)
}

/// Exits the process with code -1 unless a supported Java runtime is installed or `dry_run` is true.
pub fn ensure_java(dry_run: bool) {
    match check_java(dry_run) {
        JavaStatus::Skipped => {}
        JavaStatus::Available => debug!("Cool!! Java is available"),
        JavaStatus::NotFound => {
            debug!("No {JAVA_EXE_PATH} executable found on PATH");
            exit_without_java()
        }
        JavaStatus::UnsupportedRuntime(output) => {
            debug!("java -version gave: {}", output.trim());
            exit_without_java()
        }
    }
}

fn exit_without_java() -> ! {
    error!("Java>= 17 Must be installed");
    std::process::exit(-1)
}
