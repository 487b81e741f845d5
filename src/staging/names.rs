// src/staging/names.rs

//! Client-supplied file name handling.

use std::path::Path;

/// Reduce a client-supplied file name to a safe final path component.
///
/// Browsers may send full paths (`C:\\dumps\\a.ibd`) or relative ones
/// (`dir/a.ibd`); only the last component is kept. Returns `None` for names
/// that cannot be stored inside the staging directory (empty, `.`/`..`, or
/// hidden dot-files).
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(raw).trim();

    if last.is_empty() || last == "." || last == ".." || last.starts_with('.') {
        return None;
    }
    if last.contains('\0') {
        return None;
    }
    Some(last.to_string())
}

/// Whether `name` ends in `.<extension>` (case-sensitive).
pub fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == extension)
}
