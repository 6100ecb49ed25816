//! Tool surface of the search service.
//!
//! Two tools are exposed to agents: `search_keywords` and `list_files`.
//! The handlers here are transport-agnostic; [`server`] speaks the
//! line-delimited JSON-RPC protocol around them.

pub mod server;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::DocError;
use crate::services::SearchService;
use crate::types::{FileSearchResult, SearchScope, StoredFile};

pub use server::ToolServer;

pub const SEARCH_KEYWORDS: &str = "search_keywords";
pub const LIST_FILES: &str = "list_files";

#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub regex: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    pub results: Vec<FileSearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedFile {
    pub file_name: String,
    pub original_file_name: String,
    pub is_original: bool,
}

impl From<StoredFile> for ListedFile {
    fn from(file: StoredFile) -> Self {
        Self {
            file_name: file.name,
            original_file_name: file.original_name,
            is_original: file.is_original,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesOutput {
    pub files: Vec<ListedFile>,
}

pub fn handle_search(service: &SearchService, input: SearchInput) -> Result<SearchOutput, DocError> {
    let scope = SearchScope::from_files(input.files);
    let results = service.search_keywords(&input.keywords, &scope, input.regex)?;
    Ok(SearchOutput { results })
}

pub fn handle_list_files(service: &SearchService) -> Result<ListFilesOutput, DocError> {
    let files = service.list_files()?.into_iter().map(ListedFile::from).collect();
    Ok(ListFilesOutput { files })
}

/// Descriptors returned by `tools/list`
pub fn tool_descriptors() -> Value {
    json!([
        {
            "name": SEARCH_KEYWORDS,
            "description": "Search for keywords (or regex patterns) line by line in uploaded files. \
                Converted documents can be addressed by their original name, e.g. 'report.pdf'. \
                Without 'files', every file in the shared directory is searched.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "keywords": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Keywords to search for, case-insensitive"
                    },
                    "files": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Specific files to search in"
                    },
                    "regex": {
                        "type": "boolean",
                        "description": "Treat keywords as regular expressions",
                        "default": false
                    }
                },
                "required": ["keywords"]
            }
        },
        {
            "name": LIST_FILES,
            "description": "List every file in the shared directory with its original name.",
            "inputSchema": { "type": "object", "properties": {} }
        }
    ])
}
