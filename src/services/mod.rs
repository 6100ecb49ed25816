pub mod convert_service;
pub mod file_service;
pub mod naming;
pub mod search_service;
pub mod upload_service;

pub use convert_service::{DocumentConverter, MarkdownConverter};
pub use file_service::FileService;
pub use search_service::SearchService;
pub use upload_service::UploadService;
