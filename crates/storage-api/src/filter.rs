//! Listing filters: hidden files and configured exclusions

use crate::paths::{last_segment, looks_like_file};
use regex::Regex;

/// Matches any key with a segment starting with `.`
pub const HIDDEN_PATTERN: &str = r"(/\.|^\.)";

/// Compiled set of listing filters, built once at startup
#[derive(Clone, Debug)]
pub struct FileFilter {
    hidden: Regex,
    excluded_folders: Option<Regex>,
    excluded_files: Option<Regex>,
}

/// Case-insensitive union of the non-empty patterns, or `None` if there are none
fn union(patterns: &[String]) -> Result<Option<Regex>, regex::Error> {
    let patterns: Vec<&str> = patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    if patterns.is_empty() {
        return Ok(None);
    }

    Regex::new(&format!("(?i){}", patterns.join("|"))).map(Some)
}

impl FileFilter {
    /// Compile the hidden-file pattern plus the configured exclusions
    pub fn new(excluded_folders: &[String], excluded_files: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            hidden: Regex::new(&format!("(?i){}", HIDDEN_PATTERN))?,
            excluded_folders: union(excluded_folders)?,
            excluded_files: union(excluded_files)?,
        })
    }

    /// Whether the key is hidden or excluded by configuration
    pub fn is_excluded(&self, key: &str) -> bool {
        self.hidden.is_match(key)
            || self.excluded_folders.as_ref().is_some_and(|re| re.is_match(key))
            || self.excluded_files.as_ref().is_some_and(|re| re.is_match(key))
    }

    /// Whether a listing entry should be shown to clients.
    ///
    /// Keys whose last segment has no `.` are directory markers and never
    /// listed.
    pub fn is_listed(&self, key: &str) -> bool {
        !self.is_excluded(key) && looks_like_file(last_segment(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[rstest]
    #[case("docs/readme.txt", true)]
    #[case("docs/.hidden", false)]
    #[case(".env", false)]
    #[case("docs/.git/config.txt", false)]
    #[case("docs/subfolder", false)]
    #[case("docs/", false)]
    fn test_default_filter(#[case] key: &str, #[case] listed: bool) {
        let filter = FileFilter::new(&[], &[]).unwrap();
        assert_eq!(filter.is_listed(key), listed);
    }

    #[test]
    fn test_excluded_folders_are_case_insensitive() {
        let filter = FileFilter::new(&strings(&["private/", "", "tmp/"]), &[]).unwrap();

        assert!(!filter.is_listed("Private/report.pdf"));
        assert!(!filter.is_listed("docs/TMP/a.txt"));
        assert!(filter.is_listed("docs/a.txt"));
    }

    #[test]
    fn test_excluded_files() {
        let filter = FileFilter::new(&[], &strings(&[r"\.log$", "thumbs\\.db"])).unwrap();

        assert!(!filter.is_listed("docs/server.LOG"));
        assert!(!filter.is_listed("images/Thumbs.db"));
        assert!(filter.is_listed("docs/server.txt"));
    }

    #[test]
    fn test_blank_patterns_are_ignored() {
        let filter = FileFilter::new(&strings(&["", "  "]), &strings(&[""])).unwrap();
        assert!(filter.is_listed("docs/a.txt"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(FileFilter::new(&strings(&["(unclosed"]), &[]).is_err());
    }
}
