use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExportError;

// Default configuration constants
pub const DEFAULT_API_BASE_URL: &str = "https://app.rackbeat.com/api";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "product_units.csv";

pub const TOKEN_ENV_VAR: &str = "RACKBEAT_BEARER_TOKEN";
pub const API_BASE_URL_ENV_VAR: &str = "RACKBEAT_API_BASE_URL";

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

/// Resolve the bearer token, preferring the explicit flag over the environment.
///
/// Blank values count as absent.
pub fn resolve_token(flag: Option<&str>, env_value: Option<String>) -> Result<String, ExportError> {
    flag.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env_value
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .ok_or_else(|| {
            ExportError::Config(format!(
                "Bearer token is required via --token or {}",
                TOKEN_ENV_VAR
            ))
        })
}

pub fn get_api_base_url() -> String {
    match std::env::var(API_BASE_URL_ENV_VAR) {
        Ok(raw) => sanitize_base_url(&raw),
        Err(_) => DEFAULT_API_BASE_URL.to_string(),
    }
}

pub fn sanitize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Where results are written: the explicit path, or `product_units.csv` beside the input.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .map(|dir| dir.join(DEFAULT_OUTPUT_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE_NAME)),
    }
}

pub fn timeout_from_secs(secs: f64) -> Result<Duration, ExportError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ExportError::Config(format!(
            "Timeout must be a positive number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}
