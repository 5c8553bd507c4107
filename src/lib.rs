pub mod case_ids;
pub mod config;
pub mod index;
pub mod matching;
pub mod mover;
pub mod report;
pub mod run;
pub mod types;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::Colorize;

/// Convert `OsStr` to String with invalid Unicode handling.
pub fn os_str_to_string(name: &OsStr) -> String {
    name.to_str().map_or_else(
        || name.to_string_lossy().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to string with invalid Unicode handling.
pub fn path_to_string(path: &Path) -> String {
    path.to_str().map_or_else(
        || path.to_string_lossy().to_string().replace('\u{FFFD}', ""),
        std::string::ToString::to_string,
    )
}

/// Convert given path to filename string with invalid Unicode handling.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    os_str_to_string(path.file_name().unwrap_or_default())
}

/// Resolve a path that must exist and be a directory to its absolute form.
pub fn resolve_existing_dir(path: &Path, label: &str) -> Result<PathBuf> {
    if !path.exists() {
        anyhow::bail!("{label} does not exist or is not accessible: '{}'", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("{label} is not a directory: '{}'", path.display());
    }
    dunce::canonicalize(path).with_context(|| format!("Failed to resolve {label}: '{}'", path.display()))
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

#[inline]
pub fn print_bold(message: &str) {
    println!("{}", message.bold());
}

#[macro_export]
macro_rules! print_bold {
    ($($arg:tt)*) => {
        $crate::print_bold(&format!($($arg)*))
    };
}

/// Generate a shell completion script to stdout.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) {
    clap_complete::generate(shell, &mut command, command_name, &mut std::io::stdout());
}
