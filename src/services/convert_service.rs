use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use docx_rs::{DocumentChild, ParagraphChild, RunChild, read_docx};
use log::{debug, warn};

/// Turns a document on disk into Markdown text.
///
/// Errors are plain messages; the caller attaches the file name.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, path: &Path, extension: &str) -> Result<String, String>;
}

/// Converter backed by pure-Rust readers for PDF and Office formats
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }

    fn convert_pdf(path: &Path) -> Result<String, String> {
        // pdf-extract panics on some malformed inputs
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text(path));
        match extracted {
            Ok(Ok(text)) => Ok(text.replace('\u{c}', "\n\n")),
            Ok(Err(e)) => Err(format!("PDF text extraction failed: {e}")),
            Err(_) => {
                warn!("PDF extraction panicked for {:?}", path);
                Err("PDF text extraction failed on a malformed document".to_string())
            }
        }
    }

    fn convert_docx(path: &Path) -> Result<String, String> {
        let data = fs::read(path).map_err(|e| format!("Failed to read file: {e}"))?;
        let docx = read_docx(&data).map_err(|e| format!("Failed to parse DOCX: {e}"))?;

        let mut markdown = String::new();
        for child in docx.document.children {
            let DocumentChild::Paragraph(para) = child else {
                continue;
            };

            let mut text = String::new();
            for child in &para.children {
                if let ParagraphChild::Run(run) = child {
                    for child in &run.children {
                        match child {
                            RunChild::Text(t) => text.push_str(&t.text),
                            RunChild::Tab(_) => text.push('\t'),
                            RunChild::Break(_) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            if text.trim().is_empty() {
                continue;
            }

            let style = para.property.style.as_ref().map(|s| s.val.as_str());
            if let Some(level) = style.and_then(heading_level) {
                markdown.push_str(&"#".repeat(level));
                markdown.push(' ');
            } else if para.property.numbering_property.is_some() {
                markdown.push_str("- ");
            }
            markdown.push_str(text.trim_end());
            markdown.push_str("\n\n");
        }
        Ok(markdown)
    }

    fn convert_pptx(path: &Path) -> Result<String, String> {
        use pptx_to_md::{ParserConfig, PptxContainer};

        let config = ParserConfig::builder()
            .extract_images(false)
            .include_slide_comment(true)
            .build();

        let mut container = PptxContainer::open(path, config)
            .map_err(|e| format!("Failed to open PPTX: {e}"))?;
        let slides = container
            .parse_all()
            .map_err(|e| format!("Failed to parse PPTX slides: {e}"))?;

        let mut markdown = String::new();
        for slide in slides {
            if let Some(md) = slide.convert_to_md() {
                markdown.push_str(&md);
                markdown.push_str("\n\n");
            }
        }
        Ok(markdown)
    }

    fn convert_spreadsheet(path: &Path) -> Result<String, String> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| format!("Failed to open spreadsheet: {e}"))?;

        let mut markdown = String::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| format!("Failed to read sheet '{sheet_name}': {e}"))?;

            markdown.push_str(&format!("## {sheet_name}\n\n"));
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(|cell| table_cell(&cell.to_string())).collect())
                .filter(|cells: &Vec<String>| cells.iter().any(|c| !c.is_empty()))
                .collect();
            markdown.push_str(&markdown_table(&rows));
            markdown.push('\n');
        }
        Ok(markdown)
    }
}

impl DocumentConverter for MarkdownConverter {
    fn convert(&self, path: &Path, extension: &str) -> Result<String, String> {
        debug!("Converting {:?} as {}", path, extension);
        match extension {
            "pdf" => Self::convert_pdf(path),
            "docx" => Self::convert_docx(path),
            "pptx" => Self::convert_pptx(path),
            "xlsx" | "xls" => Self::convert_spreadsheet(path),
            "doc" | "ppt" => Err(format!(
                "legacy binary .{extension} documents cannot be converted; save as .{extension}x and upload again"
            )),
            other => Err(format!("no converter for '.{other}' files")),
        }
    }
}

/// `Heading1`..`Heading6` and `Title` paragraph styles
fn heading_level(style: &str) -> Option<usize> {
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    let level = style
        .strip_prefix("Heading")
        .or_else(|| style.strip_prefix("heading"))?
        .trim()
        .parse::<usize>()
        .ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ").trim().to_string()
}

/// Render rows as a Markdown table, first row as header
fn markdown_table(rows: &[Vec<String>]) -> String {
    let Some(width) = rows.iter().map(Vec::len).max().filter(|w| *w > 0) else {
        return String::new();
    };

    let render_row = |row: &[String]| {
        let mut line = String::from("|");
        for i in 0..width {
            line.push(' ');
            line.push_str(row.get(i).map(String::as_str).unwrap_or(""));
            line.push_str(" |");
        }
        line.push('\n');
        line
    };

    let mut table = render_row(&rows[0]);
    table.push('|');
    table.push_str(&" --- |".repeat(width));
    table.push('\n');
    for row in &rows[1..] {
        table.push_str(&render_row(row));
    }
    table
}
