//! Loaders for whitespace-separated `identifier value` line tables.
//!
//! The first token of every line is the identifier; what follows is either
//! kept whole (joined value) or tokenized, depending on the loader. A missing
//! file surfaces as the underlying io error.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::errors::DatabaseError;

/// Load `identifier value...` lines into identifier to rest-of-line.
///
/// Values keep internal whitespace (transcriptions contain spaces) but are
/// trimmed at both ends. Blank lines are ignored; a repeated identifier keeps
/// its first position and takes the last value.
pub fn load_keyed_lines(path: &Path) -> Result<IndexMap<String, String>, DatabaseError> {
    let raw = fs::read_to_string(path)?;
    let mut table = IndexMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, value) = match line.split_once(char::is_whitespace) {
            Some((id, value)) => (id, value.trim()),
            None => (line, ""),
        };
        table.insert(id.to_string(), value.to_string());
    }
    Ok(table)
}

/// Load `identifier token...` lines into identifier to token list.
pub fn load_keyed_token_lines(path: &Path) -> Result<IndexMap<String, Vec<String>>, DatabaseError> {
    let raw = fs::read_to_string(path)?;
    let mut table = IndexMap::new();
    for line in raw.lines() {
        let mut tokens = line.split_whitespace().map(str::to_string);
        let Some(id) = tokens.next() else {
            continue;
        };
        table.insert(id, tokens.collect());
    }
    Ok(table)
}
