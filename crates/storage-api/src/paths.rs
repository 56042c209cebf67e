//! Path and filename rules shared by the file handlers

use crate::ApiError;

/// Last `/`-separated segment of a path (empty for a trailing slash)
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Split a key into `(folder, filename)`; keys without `/` have an empty folder
pub fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(idx) => (&key[..idx], &key[idx + 1..]),
        None => ("", key),
    }
}

/// A filename must carry an extension; bare segments are treated as folders
pub fn looks_like_file(segment: &str) -> bool {
    segment.contains('.')
}

/// Listing prefixes must not end in a filename
pub fn validate_folder_path(path: &str) -> Result<(), ApiError> {
    if looks_like_file(last_segment(path)) {
        return Err(ApiError::validation("File name is not allowed"));
    }
    Ok(())
}

/// Download/delete paths must end in a filename.
///
/// Returns the filename on success.
pub fn validate_file_path(path: &str) -> Result<&str, ApiError> {
    let filename = last_segment(path);
    if filename.is_empty() {
        return Err(ApiError::validation("File name is missing"));
    }
    if !looks_like_file(filename) {
        return Err(ApiError::validation("File name is not allowed"));
    }
    Ok(filename)
}

/// Normalise an upload folder: strip surrounding slashes and whitespace
pub fn normalize_folder(folder: &str) -> &str {
    folder.trim().trim_matches('/')
}

/// Object key for an uploaded file
pub fn join_key(folder: &str, filename: &str) -> String {
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", folder, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("docs/readme.txt", "readme.txt")]
    #[case("docs/", "")]
    #[case("readme.txt", "readme.txt")]
    #[case("", "")]
    #[case("a/b/c", "c")]
    fn test_last_segment(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(last_segment(path), expected);
    }

    #[rstest]
    #[case("docs/readme.txt", ("docs", "readme.txt"))]
    #[case("a/b/c.png", ("a/b", "c.png"))]
    #[case("root.txt", ("", "root.txt"))]
    fn test_split_key(#[case] key: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_key(key), expected);
    }

    #[rstest]
    #[case("docs", true)]
    #[case("docs/2024", true)]
    #[case("", true)]
    #[case("docs/readme.txt", false)]
    #[case("v1.2", false)]
    fn test_validate_folder_path(#[case] path: &str, #[case] ok: bool) {
        assert_eq!(validate_folder_path(path).is_ok(), ok);
    }

    #[rstest]
    #[case("", "File name is missing")]
    #[case("docs/", "File name is missing")]
    #[case("docs/readme", "File name is not allowed")]
    #[case("docs", "File name is not allowed")]
    fn test_validate_file_path_rejects(#[case] path: &str, #[case] message: &str) {
        let err = validate_file_path(path).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_validate_file_path_returns_filename() {
        assert_eq!(validate_file_path("docs/readme.txt").unwrap(), "readme.txt");
    }

    #[rstest]
    #[case("/docs/", "docs")]
    #[case(" docs/2024 ", "docs/2024")]
    #[case("///", "")]
    fn test_normalize_folder(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_folder(raw), expected);
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("docs", "a.txt"), "docs/a.txt");
        assert_eq!(join_key("", "a.txt"), "a.txt");
    }
}
