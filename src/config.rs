// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Default length of a freshly imported exam, in minutes.
pub const DEFAULT_EXAM_DURATION_MINUTES: i32 = 60;

/// Roles every deployment starts with.
pub const DEFAULT_ROLES: [(&str, &str); 4] = [
    ("Candidate", "Role to take exams"),
    ("Exam Administrator", "Role to manage exams"),
    ("Question Manager", "Role to manage questions"),
    ("Admin", "Full access"),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
    pub cloudinary: CloudinaryConfig,
    pub default_exam_duration: i32,
    pub max_upload_mb: usize,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
}

/// Settings for the remote image host.
/// Upload is disabled unless both `cloud_name` and `upload_preset` are present.
#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub api_base: String,
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub timeout_secs: u64,
}

impl CloudinaryConfig {
    pub fn is_enabled(&self) -> bool {
        self.cloud_name.is_some() && self.upload_preset.is_some()
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let cloudinary = CloudinaryConfig {
            api_base: env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
            cloud_name: non_empty_var("CLOUDINARY_CLOUD_NAME"),
            upload_preset: non_empty_var("CLOUDINARY_UPLOAD_PRESET"),
            timeout_secs: parsed_var("UPLOAD_TIMEOUT_SECS", 30),
        };

        Self {
            database_url,
            rust_log,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            cloudinary,
            default_exam_duration: parsed_var("DEFAULT_EXAM_DURATION", DEFAULT_EXAM_DURATION_MINUTES),
            max_upload_mb: parsed_var("MAX_UPLOAD_MB", 20),
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            admin_email: non_empty_var("ADMIN_EMAIL"),
        }
    }

    /// Upload size limit in bytes for the import endpoints.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
