//! `environment.properties` for report correlation

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::EntityApi;
use crate::config::HarnessConfig;

pub const ENVIRONMENT_FILE: &str = "environment.properties";

/// Gather platform and API metadata
///
/// A failed version lookup is recorded as `Unknown` rather than failing the run.
pub async fn collect_environment(config: &HarnessConfig, api: &EntityApi) -> Vec<(String, String)> {
    let api_version = match api.api_version().await {
        Ok(version) => version,
        Err(e) => {
            warn!("API version lookup failed: {}", e);
            "Unknown".to_string()
        }
    };

    vec![
        ("Harness Version".to_string(), crate::VERSION.to_string()),
        (
            "Platform".to_string(),
            format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        ),
        ("API Base URL".to_string(), config.app_url.clone()),
        ("Browser".to_string(), config.effective_browser().as_str().to_string()),
        ("Mode".to_string(), config.mode.as_str().to_string()),
        ("API Version".to_string(), api_version),
    ]
}

/// Write `key=value` lines into `dir/environment.properties`
pub fn write_environment_file(dir: &Path, entries: &[(String, String)]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut content = String::new();
    for (key, value) in entries {
        // properties values are single-line
        let value = value.trim().replace('\n', " ");
        content.push_str(&format!("{}={}\n", key, value));
    }

    let path = dir.join(ENVIRONMENT_FILE);
    std::fs::write(&path, content)?;
    info!("Environment written to: {}", path.display());
    Ok(path)
}
