use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

/// Prefix under which every upload is stored
pub const UPLOAD_PREFIX: &str = "uploads";

/// Content type used when the client does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const MAX_FILENAME_LEN: usize = 255;

/// Device names Windows refuses as filenames
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Flattens a client-supplied filename into a token that is safe to use
/// inside a storage key.
///
/// Accented letters fold to ASCII (`résumé` becomes `resume`), path
/// separators become `_`, anything outside `[A-Za-z0-9_.-]` is dropped,
/// and leading/trailing dots and underscores are trimmed, so `../etc/passwd`
/// becomes `etc_passwd`. Returns `None` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    // NFKD splits accented letters into base letter + combining mark,
    // so `é` keeps its `e` once non-ASCII is dropped
    let spaced: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut name = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();
    if name.is_empty() {
        return None;
    }

    let stem = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        name.insert(0, '_');
    }

    // ASCII only at this point, so any byte index is a char boundary
    name.truncate(MAX_FILENAME_LEN);

    Some(name)
}

/// Builds `uploads/<YYYYMMDDHHMMSS>-<filename>` from a UTC instant
pub fn storage_key(filename: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}",
        UPLOAD_PREFIX,
        at.format("%Y%m%d%H%M%S"),
        filename
    )
}

/// Normalizes the client-declared content type, falling back to
/// `application/octet-stream`
pub fn effective_content_type(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|m| m.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test.pdf").unwrap(), "test.pdf");
        assert_eq!(sanitize_filename("my file.doc").unwrap(), "my_file.doc");
        assert_eq!(
            sanitize_filename("test<script>.pdf").unwrap(),
            "testscript.pdf"
        );
    }

    #[test]
    fn test_sanitize_path_traversal() {
        assert_eq!(sanitize_filename("../etc/passwd").unwrap(), "etc_passwd");
        assert_eq!(
            sanitize_filename("..\\..\\windows\\system32.dll").unwrap(),
            "windows_system32.dll"
        );
        assert_eq!(
            sanitize_filename("/var/tmp/report final.csv").unwrap(),
            "var_tmp_report_final.csv"
        );
    }

    #[test]
    fn test_sanitize_strips_hidden_and_non_ascii() {
        assert_eq!(sanitize_filename(".bashrc").unwrap(), "bashrc");
        assert_eq!(sanitize_filename("résumé.pdf").unwrap(), "resume.pdf");
        assert_eq!(sanitize_filename("café menu.txt").unwrap(), "cafe_menu.txt");
        assert_eq!(sanitize_filename("__init__.py").unwrap(), "init__.py");
    }

    #[test]
    fn test_sanitize_rejects_empty_results() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("../.."), None);
        assert_eq!(sanitize_filename("日本語"), None);
    }

    #[test]
    fn test_sanitize_reserved_device_names() {
        assert_eq!(sanitize_filename("CON").unwrap(), "_CON");
        assert_eq!(sanitize_filename("nul.txt").unwrap(), "_nul.txt");
        assert_eq!(sanitize_filename("console.txt").unwrap(), "console.txt");
    }

    #[test]
    fn test_sanitize_length_limit() {
        let long_name = format!("{}.txt", "a".repeat(300));
        assert_eq!(sanitize_filename(&long_name).unwrap().len(), 255);
    }

    #[test]
    fn test_storage_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            storage_key("report.pdf", at),
            "uploads/20240307090501-report.pdf"
        );
    }

    #[test]
    fn test_effective_content_type() {
        assert_eq!(effective_content_type(None), "application/octet-stream");
        assert_eq!(effective_content_type(Some("")), "application/octet-stream");
        assert_eq!(effective_content_type(Some("text/plain")), "text/plain");
        assert_eq!(
            effective_content_type(Some("not a mime")),
            "application/octet-stream"
        );
    }
}
