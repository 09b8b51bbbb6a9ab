//! Shared plumbing for the `gramc` and `gram` binaries.

use std::path::Path;
use std::process::exit;

/// Exit statuses shared by both binaries: 1 for parse/load problems, 2
/// for expansion and usage problems.
pub const EXIT_PARSE: i32 = 1;
pub const EXIT_EXPAND: i32 = 2;
pub const EXIT_USAGE: i32 = 2;

/// Print to stderr and exit with the given status.
pub fn fail(status: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    exit(status);
}

/// Read a whole file, or exit.
pub fn read_file(path: &Path, status: i32) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => fail(status, format_args!("unable to read '{}': {e}", path.display())),
    }
}

/// Write a whole file, or exit.
pub fn write_file(path: &Path, bytes: &[u8], status: i32) {
    if let Err(e) = std::fs::write(path, bytes) {
        fail(status, format_args!("unable to write '{}': {e}", path.display()));
    }
}
