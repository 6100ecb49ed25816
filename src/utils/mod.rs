use std::path::{Component, Path};

/// Decode bytes as UTF-8, silently dropping invalid sequences
pub fn decode_lenient(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Strip trailing `\n` and `\r` characters, leaving other whitespace alone
pub fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Lower-cased text after the last `.` of a file name, or "" when there is none
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Reduce a client-supplied upload name to a bare file name.
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    let last = normalized.rsplit('/').next()?.trim();
    if last.is_empty() {
        return None;
    }
    match Path::new(last).components().next() {
        Some(Component::Normal(_)) => Some(last.to_string()),
        _ => None,
    }
}

/// True when `name` names a file directly inside a directory, with no path parts
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_dropped() {
        assert_eq!(decode_lenient(b"caf\xc3\xa9 \xff\xfebar"), "café bar");
        assert_eq!(decode_lenient(b""), "");
    }

    #[test]
    fn only_newline_characters_are_stripped() {
        assert_eq!(strip_line_ending("Foo Bar\r\n"), "Foo Bar");
        assert_eq!(strip_line_ending("  indented \t\n"), "  indented \t");
        assert_eq!(strip_line_ending("no newline"), "no newline");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Report.PDF"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "");
    }

    #[test]
    fn upload_names_lose_their_directories() {
        assert_eq!(sanitize_file_name("notes.txt").as_deref(), Some("notes.txt"));
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("C:\\Users\\me\\deck.pptx").as_deref(), Some("deck.pptx"));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn plain_names_have_a_single_component() {
        assert!(is_plain_file_name("a.txt"));
        assert!(!is_plain_file_name("../a.txt"));
        assert!(!is_plain_file_name("sub/a.txt"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }
}
