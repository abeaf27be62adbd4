//! Projection of untrusted header text onto safe path segments

use regex::Regex;

/// Longest subject or sender fragment used in a path segment, in characters
pub const MAX_NAME_CHARS: usize = 50;

/// Folder used when no usable sender name survives sanitization
pub const UNKNOWN_SENDER: &str = "Unknown_Sender";

/// File name used when an attachment name sanitizes to nothing
pub const UNNAMED_ATTACHMENT: &str = "attachment";

const KEEP_PUNCTUATION: [char; 4] = [' ', '.', '_', '-'];

// `Display Name <address>`; anything after the closing bracket is ignored
static NAME_ADDR: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^(.*)\s*<.*>").unwrap());

/// Keep alphanumerics plus space, period, underscore and hyphen, then strip
/// leading and trailing periods and spaces.
///
/// Total and deterministic: any input, including the empty string, maps to a
/// string made only of allowed characters.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || KEEP_PUNCTUATION.contains(c))
        .collect();

    kept.trim_matches([' ', '.']).to_string()
}

/// First `max` characters of `text`, never splitting a character.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices()
        .nth(max)
        .map_or(text, |(idx, _)| &text[..idx])
}

/// Folder name for a decoded `From` header.
///
/// Prefers the display name of `Name <address>`, otherwise uses the whole
/// value. Absent, blank or fully stripped input yields [`UNKNOWN_SENDER`].
#[must_use]
pub fn sender_folder_name(from: Option<&str>) -> String {
    let Some(from) = from.filter(|f| !f.trim().is_empty()) else {
        return UNKNOWN_SENDER.to_string();
    };

    let name = NAME_ADDR.captures(from).and_then(|c| c.get(1)).map_or_else(
        || from.trim(),
        |m| m.as_str().trim().trim_matches('"').trim_matches('\''),
    );

    let safe = sanitize(name);
    let folder = truncate_chars(&safe, MAX_NAME_CHARS).trim_matches([' ', '.']);

    if folder.is_empty() {
        UNKNOWN_SENDER.to_string()
    } else {
        folder.to_string()
    }
}

/// Sanitized subject fragment used in a record's text file name.
#[must_use]
pub fn subject_stem(subject: &str) -> String {
    truncate_chars(&sanitize(subject), MAX_NAME_CHARS).to_string()
}

/// On-disk name for an attachment's declared file name.
#[must_use]
pub fn attachment_file_name(declared: &str) -> String {
    let safe = sanitize(declared);
    if safe.is_empty() {
        UNNAMED_ATTACHMENT.to_string()
    } else {
        safe
    }
}
