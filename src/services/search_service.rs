use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};

use crate::errors::DocError;
use crate::services::FileService;
use crate::services::naming::classify_stored_name;
use crate::types::{FileSearchResult, KeywordMatch, ResolvedName, SearchScope, StoredFile};
use crate::utils::{is_plain_file_name, strip_line_ending};

/// A keyword prepared for repeated line tests
enum KeywordMatcher<'a> {
    Substring { keyword: &'a str, needle: String },
    Pattern { keyword: &'a str, regex: Regex },
}

impl<'a> KeywordMatcher<'a> {
    /// Compile every keyword up front so a bad pattern fails before any file is read
    fn build_all(keywords: &'a [String], use_regex: bool) -> Result<Vec<Self>, DocError> {
        keywords
            .iter()
            .map(|keyword| {
                if use_regex {
                    let regex = RegexBuilder::new(keyword)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| DocError::InvalidPattern {
                            pattern: keyword.clone(),
                            cause: e.to_string(),
                        })?;
                    Ok(KeywordMatcher::Pattern { keyword: keyword.as_str(), regex })
                } else {
                    Ok(KeywordMatcher::Substring {
                        keyword: keyword.as_str(),
                        needle: keyword.to_lowercase(),
                    })
                }
            })
            .collect()
    }

    fn keyword(&self) -> &'a str {
        match self {
            KeywordMatcher::Substring { keyword, .. } | KeywordMatcher::Pattern { keyword, .. } => *keyword,
        }
    }

    fn is_match(&self, line: &str, line_lower: &str) -> bool {
        match self {
            KeywordMatcher::Substring { needle, .. } => line_lower.contains(needle.as_str()),
            KeywordMatcher::Pattern { regex, .. } => regex.is_match(line),
        }
    }
}

/// Service for keyword and regex search over the shared directory
#[derive(Debug, Clone)]
pub struct SearchService {
    file_service: FileService,
}

impl SearchService {
    /// Create a new search service
    pub fn new(file_service: FileService) -> Self {
        Self { file_service }
    }

    /// List every stored file; an absent directory lists as empty
    pub fn list_files(&self) -> Result<Vec<StoredFile>, DocError> {
        self.file_service.list_files()
    }

    /// Search `keywords` line by line in every file of `scope`.
    ///
    /// Returns one result per searched file, including files without
    /// matches, in the order the targets were resolved. Any failure aborts
    /// the whole search.
    pub fn search_keywords(
        &self,
        keywords: &[String],
        scope: &SearchScope,
        use_regex: bool,
    ) -> Result<Vec<FileSearchResult>, DocError> {
        info!(
            "Starting {} search for {} keyword(s)",
            if use_regex { "regex" } else { "keyword" },
            keywords.len()
        );
        let start_time = std::time::Instant::now();

        self.file_service.ensure_directory()?;
        let targets = self.resolve_targets(scope)?;
        let matchers = KeywordMatcher::build_all(keywords, use_regex)?;

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.scan_file(target, &matchers)?);
        }

        let total: usize = results.iter().map(|r| r.matches.len()).sum();
        info!(
            "Search completed in {}ms, {} files scanned, {} matches",
            start_time.elapsed().as_millis(),
            results.len(),
            total
        );
        Ok(results)
    }

    /// Build the ordered target set together with each file's naming
    fn resolve_targets(&self, scope: &SearchScope) -> Result<Vec<ResolvedName>, DocError> {
        let names = match scope {
            SearchScope::NamedFiles(names) if !names.is_empty() => names,
            _ => {
                return Ok(self
                    .file_service
                    .regular_file_names()?
                    .into_iter()
                    .map(|actual_name| {
                        let (original_name, is_original) = classify_stored_name(&actual_name);
                        ResolvedName { actual_name, original_name, is_original }
                    })
                    .collect());
            }
        };

        let mut targets = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for requested in names {
            if !is_plain_file_name(requested) {
                missing.push(requested.as_str());
                continue;
            }
            let resolved = self.file_service.resolve_file_name(requested);
            if !self.file_service.exists(&resolved.actual_name) {
                missing.push(requested.as_str());
            } else if self.file_service.is_file(&resolved.actual_name) {
                targets.push(resolved);
            } else {
                debug!("Skipping '{}', not a regular file", resolved.actual_name);
            }
        }

        if !missing.is_empty() {
            warn!("Requested files not found: {:?}", missing);
            return Err(DocError::NotFound(format!(
                "The following files were not found in '{}': {}",
                self.file_service.base_dir().display(),
                missing.join(", ")
            )));
        }
        Ok(targets)
    }

    fn scan_file(
        &self,
        target: ResolvedName,
        matchers: &[KeywordMatcher<'_>],
    ) -> Result<FileSearchResult, DocError> {
        let mut matches = Vec::new();
        self.file_service.for_each_line(&target.actual_name, |line_number, raw| {
            let line = strip_line_ending(raw);
            let line_lower = line.to_lowercase();
            for matcher in matchers {
                if matcher.is_match(line, &line_lower) {
                    matches.push(KeywordMatch {
                        keyword: matcher.keyword().to_string(),
                        line_number,
                        line_content: line.to_string(),
                    });
                }
            }
            Ok(())
        })?;

        debug!("Found {} matches in '{}'", matches.len(), target.actual_name);
        Ok(FileSearchResult {
            file_name: target.actual_name,
            original_file_name: target.original_name,
            is_original: target.is_original,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn search_service(files: &[(&str, &str)]) -> (TempDir, SearchService) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let service = SearchService::new(FileService::new(dir.path().to_path_buf()));
        (dir, service)
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn named(names: &[&str]) -> SearchScope {
        SearchScope::NamedFiles(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn substring_search_ignores_case() {
        let (_dir, service) = search_service(&[("a.txt", "one\ntwo\nFoo Bar\n")]);
        let results = service.search_keywords(&kw(&["foo"]), &named(&["a.txt"]), false).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].matches,
            vec![KeywordMatch {
                keyword: "foo".into(),
                line_number: 3,
                line_content: "Foo Bar".into(),
            }]
        );
    }

    #[test]
    fn anchored_regex_matches_whole_line_only() {
        let (_dir, service) = search_service(&[("a.txt", "bar\nfoobar\nBAR\r\n")]);
        let results = service.search_keywords(&kw(&["^b.*r$"]), &named(&["a.txt"]), true).unwrap();

        let lines: Vec<usize> = results[0].matches.iter().map(|m| m.line_number).collect();
        assert_eq!(lines, vec![1, 3]);
        assert_eq!(results[0].matches[1].line_content, "BAR");
    }

    #[test]
    fn invalid_pattern_fails_the_whole_call() {
        let (_dir, service) = search_service(&[("a.txt", "text\n")]);
        let err = service
            .search_keywords(&kw(&["ok", "(unclosed"]), &SearchScope::AllFiles, true)
            .unwrap_err();
        match err {
            DocError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_keywords_on_one_line_give_two_matches() {
        let (_dir, service) = search_service(&[("a.txt", "alpha and beta\n")]);
        let results = service
            .search_keywords(&kw(&["alpha", "beta"]), &named(&["a.txt"]), false)
            .unwrap();

        let matches = &results[0].matches;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line_number, matches[1].line_number);
        assert_eq!(matches[0].keyword, "alpha");
        assert_eq!(matches[1].keyword, "beta");
    }

    #[test]
    fn missing_files_are_reported_together() {
        let (_dir, service) = search_service(&[("present.txt", "x\n")]);
        let err = service
            .search_keywords(&kw(&["x"]), &named(&["missing.txt", "present.txt", "gone.pdf"]), false)
            .unwrap_err();
        match err {
            DocError::NotFound(message) => {
                assert!(message.ends_with(": missing.txt, gone.pdf"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_missing_file_is_named_exactly() {
        let (_dir, service) = search_service(&[]);
        let err = service
            .search_keywords(&kw(&["x"]), &named(&["missing.txt"]), false)
            .unwrap_err();
        match err {
            DocError::NotFound(message) => assert!(message.ends_with(": missing.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn original_name_resolves_to_converted_file() {
        let (_dir, service) = search_service(&[("report.pdf.markdown", "# Quarterly Revenue\n")]);
        let results = service
            .search_keywords(&kw(&["revenue"]), &named(&["report.pdf"]), false)
            .unwrap();

        let result = &results[0];
        assert_eq!(result.file_name, "report.pdf.markdown");
        assert_eq!(result.original_file_name, "report.pdf");
        assert!(!result.is_original);
        assert_eq!(result.matches[0].line_content, "# Quarterly Revenue");
    }

    #[test]
    fn all_files_scope_includes_files_without_matches() {
        let (_dir, service) = search_service(&[
            ("a.txt", "needle\n"),
            ("b.txt", "hay\n"),
            ("c.xlsx.markdown", "| needle |\n"),
        ]);
        let mut results = service
            .search_keywords(&kw(&["needle"]), &SearchScope::AllFiles, false)
            .unwrap();
        results.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].matches.len(), 1);
        assert!(results[1].matches.is_empty());
        assert_eq!(results[2].original_file_name, "c.xlsx");
        assert!(!results[2].is_original);
    }

    #[test]
    fn named_files_keep_request_order() {
        let (_dir, service) = search_service(&[("a.txt", "x\n"), ("b.txt", "x\n")]);
        let results = service
            .search_keywords(&kw(&["x"]), &named(&["b.txt", "a.txt"]), false)
            .unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn invalid_utf8_does_not_break_the_scan() {
        let (dir, service) = search_service(&[]);
        fs::write(dir.path().join("bin.log"), b"err\xff\xfeor here\n").unwrap();
        let results = service
            .search_keywords(&kw(&["error"]), &named(&["bin.log"]), false)
            .unwrap();
        assert_eq!(results[0].matches[0].line_content, "error here");
    }

    #[test]
    fn missing_directory_fails_before_searching() {
        let dir = TempDir::new().unwrap();
        let service = SearchService::new(FileService::new(dir.path().join("absent")));
        let err = service
            .search_keywords(&kw(&["x"]), &SearchScope::AllFiles, false)
            .unwrap_err();
        assert!(matches!(err, DocError::NotFound(_)));
    }

    #[test]
    fn path_like_names_count_as_missing() {
        let (_dir, service) = search_service(&[("a.txt", "x\n")]);
        let err = service
            .search_keywords(&kw(&["x"]), &named(&["../a.txt"]), false)
            .unwrap_err();
        assert!(matches!(err, DocError::NotFound(_)));
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let (dir, service) = search_service(&[]);
        fs::write(dir.path().join("mac.txt"), b"alpha\rFoo Bar\rgamma\r").unwrap();

        let results = service
            .search_keywords(&kw(&["foo"]), &named(&["mac.txt"]), false)
            .unwrap();
        let found = &results[0].matches;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line_number, 2);
        assert_eq!(found[0].line_content, "Foo Bar");

        let results = service
            .search_keywords(&kw(&["^foo bar$"]), &named(&["mac.txt"]), true)
            .unwrap();
        assert_eq!(results[0].matches.len(), 1);
        assert_eq!(results[0].matches[0].line_number, 2);
    }

    #[cfg(unix)]
    #[test]
    fn all_files_search_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, service) = search_service(&[("a.txt", "needle")]);
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xffname.txt")), "needle").unwrap();

        let results = service
            .search_keywords(&kw(&["needle"]), &SearchScope::AllFiles, false)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_name, "a.txt");
        assert_eq!(results[0].matches.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn read_failure_aborts_the_whole_search() {
        let (dir, service) = search_service(&[("a.txt", "needle")]);
        // Reading offset 0 of a process's own memory fails with EIO.
        std::os::unix::fs::symlink("/proc/self/mem", dir.path().join("mem.txt")).unwrap();

        let err = service
            .search_keywords(&kw(&["needle"]), &named(&["a.txt", "mem.txt"]), false)
            .unwrap_err();
        match err {
            DocError::Io { file, .. } => assert_eq!(file, "mem.txt"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = service
            .search_keywords(&kw(&["needle"]), &SearchScope::AllFiles, false)
            .unwrap_err();
        assert!(matches!(err, DocError::Io { ref file, .. } if file == "mem.txt"));
    }
}
