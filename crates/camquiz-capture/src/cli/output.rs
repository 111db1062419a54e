//! Output mode flags shared by all subcommands.
//!
//! `main` records the global flags in the environment so every command
//! can check them without threading them through.

use serde::Serialize;

pub const JSON_ENV: &str = "CAMQUIZ_JSON";
pub const QUIET_ENV: &str = "CAMQUIZ_QUIET";

/// True when `--json` was given.
pub fn is_json() -> bool {
    std::env::var_os(JSON_ENV).is_some()
}

/// True when `--quiet` was given.
pub fn is_quiet() -> bool {
    std::env::var_os(QUIET_ENV).is_some()
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}
