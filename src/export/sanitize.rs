//! Filename sanitization for the output tree.
//!
//! Page and space titles come straight from Confluence and can contain
//! characters that are invalid in filenames on at least one platform the
//! output tree might be checked out on. Offending characters are replaced
//! with their percent-encoding so distinct titles stay distinct.

use std::path::Path;

/// Names Windows reserves for devices regardless of extension.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest filename accepted by common filesystems.
const MAX_FILENAME_CHARS: usize = 255;

/// Make a title safe to use as a single path component.
///
/// Characters that are invalid on Windows or act as path separators are
/// replaced with their percent-encoded form, control characters are dropped,
/// trailing spaces and dots are stripped, and reserved device names get a
/// trailing underscore. The result is capped at 255 characters.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            ':' => out.push_str("%3A"),
            '*' => out.push_str("%2A"),
            '?' => out.push_str("%3F"),
            '"' => out.push_str("%22"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '|' => out.push_str("%7C"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    // Windows rejects names ending in a space or dot.
    let mut out = out.trim_end_matches([' ', '.']).to_string();

    let reserved = Path::new(&out)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_ascii_uppercase())
        .is_some_and(|stem| RESERVED_NAMES.contains(&stem.as_str()));
    if reserved {
        out.push('_');
    }

    if out.chars().count() > MAX_FILENAME_CHARS {
        out = out.chars().take(MAX_FILENAME_CHARS).collect();
    }
    out
}
