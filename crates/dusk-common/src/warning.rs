//! Diagnostics with colored terminal output.
//!
//! Provides deduplication so that a stylesheet with hundreds of rules that
//! trip the same condition prints the message once.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

fn record(key: String) -> bool {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key)
}

/// Warn about a condition the user should know about (prints once per unique message).
///
/// Returns `true` if the message was printed, `false` if it was a duplicate.
///
/// # Example
/// ```ignore
/// warn_once("merge", "skipped `a, b`: linear trie node holds 2 variants");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let printed = record(format!("[{component}] {message}"));
    if printed {
        eprintln!("{}", format!("[dusk {component}] ⚠ {message}").yellow());
    }
    printed
}
