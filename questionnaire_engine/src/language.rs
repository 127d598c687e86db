//! Language code to display name mapping, used by the translation
//! table header row.

const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
]; // ISO 639-1, sorted by code

/// The English display name of a language code. Unknown codes are
/// returned unchanged so custom codes still round trip through an
/// exported table.
pub fn code_to_name(code: &str) -> String {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| n.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// The inverse of [`code_to_name`]. Matching is case-insensitive, and
/// an unknown name falls back to the trimmed input so a header that
/// already contains codes imports as well.
pub fn name_to_code(name: &str) -> String {
    let trimmed = name.trim();
    LANGUAGES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(trimmed))
        .map(|(c, _)| c.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
