//! Naming conventions of the shared directory.
//!
//! Only the Markdown rendering of a converted document is stored, as
//! `<original name>.markdown`. The mapping between the two names is derived
//! from that suffix alone.

use crate::utils::extension_of;

/// Suffix appended to the original file name of a converted document
pub const CONVERTED_SUFFIX: &str = ".markdown";

/// Extensions whose content is converted to Markdown instead of stored verbatim
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx"];

/// Extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "csv", "json", "jsonl", "xml", "html", "md", "py", "js", "ts", "log", "pdf", "docx",
    "doc", "pptx", "ppt", "xlsx", "xls",
];

pub fn is_convertible(name: &str) -> bool {
    CONVERTIBLE_EXTENSIONS.contains(&extension_of(name).as_str())
}

pub fn is_allowed(name: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension_of(name).as_str())
}

/// Allowed extensions, sorted and comma separated, for error messages
pub fn allowed_extensions_list() -> String {
    let mut allowed = ALLOWED_EXTENSIONS.to_vec();
    allowed.sort_unstable();
    allowed.join(", ")
}

/// On-disk name of the Markdown rendering of `original_name`
pub fn converted_name(original_name: &str) -> String {
    format!("{original_name}{CONVERTED_SUFFIX}")
}

/// Split an on-disk name into `(original_name, is_original)`
pub fn classify_stored_name(disk_name: &str) -> (String, bool) {
    match disk_name.strip_suffix(CONVERTED_SUFFIX) {
        Some(original) => (original.to_string(), false),
        None => (disk_name.to_string(), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_strips_markdown_suffix() {
        assert_eq!(
            classify_stored_name("report.pdf.markdown"),
            ("report.pdf".to_string(), false)
        );
        assert_eq!(classify_stored_name("report.pdf"), ("report.pdf".to_string(), true));
        assert_eq!(classify_stored_name("notes.md"), ("notes.md".to_string(), true));
    }

    #[test]
    fn convertible_set_is_case_insensitive() {
        for name in ["a.pdf", "b.DOCX", "c.Pptx", "d.xls", "e.doc", "f.ppt", "g.xlsx"] {
            assert!(is_convertible(name), "{name} should be convertible");
        }
        assert!(!is_convertible("a.txt"));
        assert!(!is_convertible("pdf"));
    }

    #[test]
    fn allow_list_rejects_executables() {
        assert!(is_allowed("script.py"));
        assert!(is_allowed("data.JSONL"));
        assert!(!is_allowed("setup.exe"));
        assert!(!is_allowed("README"));
    }

    #[test]
    fn allowed_list_is_sorted() {
        let list = allowed_extensions_list();
        assert!(list.starts_with("csv, doc, docx, html, js, json, jsonl"));
        assert!(list.ends_with("ts, txt, xls, xlsx, xml"));
    }

    #[test]
    fn converted_name_round_trips_through_classification() {
        let disk = converted_name("slides.pptx");
        assert_eq!(disk, "slides.pptx.markdown");
        assert_eq!(classify_stored_name(&disk), ("slides.pptx".to_string(), false));
    }
}
