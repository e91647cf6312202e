//! Filename sanitization for document references
//!
//! Portal references are free-form strings chosen by whoever uploaded the
//! document, so they routinely contain path separators and other characters
//! that are invalid on at least one filesystem. This module turns a reference
//! into a safe on-disk filename.

use crate::constants::files;

/// Characters that are replaced with `_` in filenames
const INVALID_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Create a valid filename from a document reference
///
/// The result contains none of `\ / * ? : " < > |`, is truncated to at most
/// 100 characters before the extension, and always ends with `.pdf` (appended
/// unless already present, case-insensitively). Pure and total: any input
/// yields a usable filename.
pub fn sanitize_reference(reference: &str) -> String {
    let mut sanitized: String = reference
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .take(files::MAX_STEM_LENGTH)
        .collect();

    if !sanitized
        .to_lowercase()
        .ends_with(files::DOCUMENT_EXTENSION)
    {
        sanitized.push_str(files::DOCUMENT_EXTENSION);
    }
    sanitized
}
