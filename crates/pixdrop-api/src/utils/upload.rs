//! Common utilities for the upload handler

const MAX_FILENAME_LENGTH: usize = 255;
const FALLBACK_FILENAME: &str = "file";

/// Reduce a client supplied filename to a safe single path segment.
///
/// Directory components are dropped and anything outside `[alnum . - _]` is
/// replaced with `_`. Names that end up empty or made only of dots become
/// `file`.
pub fn sanitize_filename(filename: &str) -> String {
    // Clients on Windows may send full paths with backslashes.
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    sanitized
}
