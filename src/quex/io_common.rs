use std::path::Path;

pub fn file_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_excel(path: &str) -> bool {
    matches!(file_extension(path).as_deref(), Some("xlsx"))
}
