use std::io::Write;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::DEFAULT_MAX_UPLOAD_FILES;
use crate::errors::DocError;
use crate::services::FileService;
use crate::services::convert_service::DocumentConverter;
use crate::services::naming::{allowed_extensions_list, converted_name, is_allowed, is_convertible};
use crate::types::{StoredFile, UploadedFile};
use crate::utils::{extension_of, sanitize_file_name};

/// An upload that passed validation and is ready to be written
struct AcceptedUpload {
    filename: String,
    extension: String,
    data: Vec<u8>,
}

/// Service that validates uploads, converts documents and persists the results
pub struct UploadService {
    file_service: FileService,
    converter: Arc<dyn DocumentConverter>,
    max_files: usize,
}

impl UploadService {
    pub fn new(file_service: FileService, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            file_service,
            converter,
            max_files: DEFAULT_MAX_UPLOAD_FILES,
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Validate every upload, then store each one.
    ///
    /// Nothing is written unless the whole batch is acceptable. Convertible
    /// documents are stored only as `<name>.markdown`.
    pub fn store_all(&self, uploads: Vec<UploadedFile>) -> Result<Vec<StoredFile>, DocError> {
        let accepted = self.validate(uploads)?;
        self.file_service.create_directory()?;

        let mut stored = Vec::with_capacity(accepted.len());
        for upload in accepted {
            let file = if is_convertible(&upload.filename) {
                self.store_converted(upload)?
            } else {
                self.store_original(upload)?
            };
            stored.push(file);
        }
        info!("Stored {} uploaded file(s)", stored.len());
        Ok(stored)
    }

    fn validate(&self, uploads: Vec<UploadedFile>) -> Result<Vec<AcceptedUpload>, DocError> {
        if uploads.is_empty() {
            return Err(DocError::BadRequest("no files were uploaded".to_string()));
        }
        if uploads.len() > self.max_files {
            return Err(DocError::TooManyFiles {
                count: uploads.len(),
                max: self.max_files,
            });
        }

        uploads
            .into_iter()
            .map(|upload| {
                let filename = sanitize_file_name(&upload.filename)
                    .ok_or_else(|| DocError::InvalidFileName(upload.filename.clone()))?;
                if !is_allowed(&filename) {
                    return Err(DocError::UnsupportedType {
                        extension: extension_of(&filename),
                        allowed: allowed_extensions_list(),
                    });
                }
                Ok(AcceptedUpload {
                    extension: extension_of(&filename),
                    filename,
                    data: upload.data,
                })
            })
            .collect()
    }

    fn store_original(&self, upload: AcceptedUpload) -> Result<StoredFile, DocError> {
        self.file_service.write_bytes(&upload.filename, &upload.data)?;
        Ok(StoredFile {
            original_name: upload.filename.clone(),
            name: upload.filename,
            is_original: true,
        })
    }

    fn store_converted(&self, upload: AcceptedUpload) -> Result<StoredFile, DocError> {
        let conversion_error = |cause: String| DocError::ConversionFailure {
            file: upload.filename.clone(),
            cause,
        };

        // Removed when dropped, on success and on every error path.
        let mut staged = tempfile::Builder::new()
            .prefix("docshelf-")
            .suffix(&format!(".{}", upload.extension))
            .tempfile()
            .map_err(|e| conversion_error(format!("could not stage upload: {e}")))?;
        staged
            .write_all(&upload.data)
            .and_then(|_| staged.flush())
            .map_err(|e| conversion_error(format!("could not stage upload: {e}")))?;
        debug!("Staged '{}' at {:?}", upload.filename, staged.path());

        let markdown = self
            .converter
            .convert(staged.path(), &upload.extension)
            .map_err(|cause| {
                warn!("Conversion of '{}' failed: {}", upload.filename, cause);
                conversion_error(cause)
            })?;

        let name = converted_name(&upload.filename);
        self.file_service.write_bytes(&name, markdown.as_bytes())?;
        info!("Converted '{}' to '{}'", upload.filename, name);

        Ok(StoredFile {
            name,
            is_original: false,
            original_name: upload.filename,
        })
    }
}
