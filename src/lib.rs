//! docshelf - upload, convert and search documents in a shared directory
//!
//! The upload service stores originals (or their Markdown conversions) in a
//! flat shared directory; the tool service lists and searches that directory,
//! resolving original document names to their converted counterparts.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod services;
pub mod tools;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use errors::DocError;
pub use types::{AppState, FileInfo, FileSearchResult, KeywordMatch, ResolvedName, SearchScope, StoredFile};
pub use services::{DocumentConverter, FileService, MarkdownConverter, SearchService, UploadService};
pub use tools::ToolServer;
