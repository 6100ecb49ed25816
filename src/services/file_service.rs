use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::DocError;
use crate::services::naming::{classify_stored_name, converted_name, is_convertible};
use crate::types::{ResolvedName, StoredFile};
use crate::utils::decode_lenient;

/// Service for handling file system operations on the shared directory
#[derive(Debug, Clone)]
pub struct FileService {
    base_dir: PathBuf,
}

impl FileService {
    /// Create a new file service
    pub fn new(base_dir: PathBuf) -> Self {
        debug!("Creating FileService with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Fail unless the shared directory exists and is a directory
    pub fn ensure_directory(&self) -> Result<(), DocError> {
        if !self.base_dir.exists() {
            warn!("Shared directory does not exist: {:?}", self.base_dir);
            return Err(DocError::NotFound(format!(
                "Directory '{}' does not exist.",
                self.base_dir.display()
            )));
        }
        if !self.base_dir.is_dir() {
            warn!("Shared path is not a directory: {:?}", self.base_dir);
            return Err(DocError::NotADirectory(self.base_dir.clone()));
        }
        Ok(())
    }

    /// Create the shared directory (and parents) if missing
    pub fn create_directory(&self) -> Result<(), DocError> {
        fs::create_dir_all(&self.base_dir).map_err(|e| {
            error!("Failed to create shared directory {:?}: {}", self.base_dir, e);
            DocError::io(self.base_dir.display().to_string(), e)
        })
    }

    /// Names of the regular files directly inside the shared directory,
    /// in filesystem iteration order
    pub fn regular_file_names(&self) -> Result<Vec<String>, DocError> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| {
            error!("Failed to read directory {:?}: {}", self.base_dir, e);
            DocError::io(self.base_dir.display().to_string(), e)
        })?;

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    // Follows symlinks, so a link to a regular file counts as one.
                    if !entry.path().is_file() {
                        continue;
                    }
                    let name = match entry.file_name().into_string() {
                        Ok(name) => name,
                        Err(raw) => {
                            warn!("Skipping file with non-UTF-8 name: {:?}", raw);
                            continue;
                        }
                    };
                    debug!("Found file: {}", name);
                    names.push(name);
                }
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                }
            }
        }
        Ok(names)
    }

    /// List every stored file, classified as original or converted.
    /// A missing shared directory lists as empty.
    pub fn list_files(&self) -> Result<Vec<StoredFile>, DocError> {
        if !self.base_dir.is_dir() {
            debug!("Shared directory {:?} is absent, listing nothing", self.base_dir);
            return Ok(Vec::new());
        }

        let files: Vec<StoredFile> = self
            .regular_file_names()?
            .into_iter()
            .map(|name| {
                let (original_name, is_original) = classify_stored_name(&name);
                StoredFile { name, is_original, original_name }
            })
            .collect();

        info!("Listed {:?}, found {} files", self.base_dir, files.len());
        Ok(files)
    }

    /// Map the name a caller uses onto the file actually stored.
    ///
    /// Convertible documents are stored as `<name>.markdown`; when such a
    /// companion exists it wins. Anything else resolves to itself.
    pub fn resolve_file_name(&self, requested: &str) -> ResolvedName {
        if is_convertible(requested) {
            let converted = converted_name(requested);
            if self.base_dir.join(&converted).exists() {
                debug!("Resolved '{}' to converted file '{}'", requested, converted);
                return ResolvedName {
                    actual_name: converted,
                    original_name: requested.to_string(),
                    is_original: false,
                };
            }
        }
        ResolvedName {
            actual_name: requested.to_string(),
            original_name: requested.to_string(),
            is_original: true,
        }
    }

    /// Check if a name exists in the shared directory
    pub fn exists(&self, name: &str) -> bool {
        self.base_dir.join(name).exists()
    }

    /// Check if a name is a regular file in the shared directory
    pub fn is_file(&self, name: &str) -> bool {
        self.base_dir.join(name).is_file()
    }

    /// Feed every line of a stored file to `visit` with its 1-based number.
    ///
    /// A line ends at `\n`, `\r\n` or a lone `\r` and keeps its ending;
    /// invalid UTF-8 is dropped.
    pub fn for_each_line<F>(&self, name: &str, mut visit: F) -> Result<(), DocError>
    where
        F: FnMut(usize, &str) -> Result<(), DocError>,
    {
        let full_path = self.base_dir.join(name);
        debug!("Scanning file: {:?}", full_path);

        let file = fs::File::open(&full_path).map_err(|e| {
            error!("Failed to open file {:?}: {}", full_path, e);
            DocError::io(name, e)
        })?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            let read = read_line(&mut reader, &mut buf).map_err(|e| {
                error!("Failed to read file {:?}: {}", full_path, e);
                DocError::io(name, e)
            })?;
            if read == 0 {
                break;
            }
            line_number += 1;
            visit(line_number, &decode_lenient(&buf))?;
        }

        debug!("Scanned {} lines of {:?}", line_number, full_path);
        Ok(())
    }

    /// Write raw bytes to `name`, replacing any existing file
    pub fn write_bytes(&self, name: &str, data: &[u8]) -> Result<(), DocError> {
        let full_path = self.base_dir.join(name);
        fs::write(&full_path, data).map_err(|e| {
            error!("Failed to write file {:?}: {}", full_path, e);
            DocError::io(name, e)
        })?;
        info!("Wrote {:?}, {} bytes", full_path, data.len());
        Ok(())
    }
}

/// Append one line to `buf`, ending at `\n`, `\r\n` or a lone `\r`.
/// Returns the number of bytes read, 0 at end of input.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let start = buf.len();
    loop {
        let (ending, used) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(buf.len() - start);
            }
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    buf.extend_from_slice(&available[..=i]);
                    (Some(available[i]), i + 1)
                }
                None => {
                    buf.extend_from_slice(available);
                    (None, available.len())
                }
            }
        };
        reader.consume(used);

        match ending {
            Some(b'\r') => {
                // \r\n is a single ending even when split across buffer fills
                if reader.fill_buf()?.first() == Some(&b'\n') {
                    buf.push(b'\n');
                    reader.consume(1);
                }
                return Ok(buf.len() - start);
            }
            Some(_) => return Ok(buf.len() - start),
            None => {}
        }
    }
}
