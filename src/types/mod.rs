use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::services::{DocumentConverter, FileService, UploadService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub uploads: Arc<UploadService>,
}

impl AppState {
    pub fn new(config: &Config, converter: Arc<dyn DocumentConverter>) -> Self {
        let files = FileService::new(config.shared_dir.as_ref().clone());
        let uploads = UploadService::new(files.clone(), converter)
            .with_max_files(config.max_upload_files);
        Self {
            files,
            uploads: Arc::new(uploads),
        }
    }
}

/// A file in the shared directory, as seen by listing and upload responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub is_original: bool,
    pub original_name: String,
}

/// Outcome of mapping a caller-supplied name onto the file actually on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub actual_name: String,
    pub original_name: String,
    pub is_original: bool,
}

/// Which files a search runs over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    AllFiles,
    NamedFiles(Vec<String>),
}

impl SearchScope {
    /// An absent or empty file list means "everything"
    pub fn from_files(files: Option<Vec<String>>) -> Self {
        match files {
            Some(names) if !names.is_empty() => SearchScope::NamedFiles(names),
            _ => SearchScope::AllFiles,
        }
    }
}

/// One line of one file that matched one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub line_number: usize,
    pub line_content: String,
}

/// All matches found in a single searched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchResult {
    pub file_name: String,
    pub original_file_name: String,
    pub is_original: bool,
    pub matches: Vec<KeywordMatch>,
}

/// Wire shape of a stored file in HTTP responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub is_original: bool,
    pub original_filename: Option<String>,
}

impl From<StoredFile> for FileInfo {
    fn from(file: StoredFile) -> Self {
        let original_filename = (!file.is_original).then_some(file.original_name);
        Self {
            filename: file.name,
            is_original: file.is_original,
            original_filename,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<FileInfo>,
}

/// An uploaded file part, before validation
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}
