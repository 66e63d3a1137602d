pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "PCA_API_URL";

pub const COMPRESS_PATH: &str = "/compress";
pub const HEALTH_PATH: &str = "/health";

pub const DEFAULT_K: u32 = 50;
pub const MIN_K: u32 = 1;
pub const MAX_K: u32 = 500;

/// Maximum upload size in bytes (100MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

pub const DEFAULT_DECIMALS: i32 = 2;
pub const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB"];
pub const SIZE_THRESHOLD: u64 = 1024;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
pub const DEFAULT_UPLOAD_NAME: &str = "upload";

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} [{elapsed_precise}]";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 Result size:";
pub const REDUCTION_PREFIX: &str = "🎯 Reduction:";
pub const TIME_PREFIX: &str = "⏱️  Time:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const INFO_PREFIX: &str = "📋";

/// Placeholder shown for statistics that are not available yet.
pub const MISSING_STAT: &str = "-";

/// Filename offered for saving a result compressed with intensity `k`.
pub fn download_file_name(k: u32) -> String {
    format!("compressed_k{}.jpg", k)
}
