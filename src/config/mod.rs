use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_SHARED_DIR: &str = "../shared-uploads";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration and constants
#[derive(Debug, Clone)]
pub struct Config {
    pub shared_dir: Arc<PathBuf>,
    pub host: String,
    pub port: u16,
    pub max_upload_files: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            shared_dir: Arc::new(PathBuf::from(DEFAULT_SHARED_DIR)),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(dir) = lookup("SHARED_UPLOADS_DIR").filter(|d| !d.trim().is_empty()) {
            config.shared_dir = Arc::new(PathBuf::from(dir));
        }
        if let Some(host) = lookup("DOCSHELF_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host;
        }
        if let Some(port) = lookup("DOCSHELF_PORT").and_then(|p| p.trim().parse().ok()) {
            config.port = port;
        }
        if let Some(limit) = lookup("DOCSHELF_MAX_UPLOAD_BYTES").and_then(|b| b.trim().parse().ok()) {
            config.max_upload_bytes = limit;
        }
        config
    }

    /// Create configuration with custom values
    pub fn with_custom(
        shared_dir: PathBuf,
        port: Option<u16>,
        host: Option<String>,
    ) -> Self {
        Self {
            shared_dir: Arc::new(shared_dir),
            port: port.unwrap_or(DEFAULT_PORT),
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            ..Self::new()
        }
    }

    /// Get the socket address for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
