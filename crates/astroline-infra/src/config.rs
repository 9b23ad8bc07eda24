//! Service configuration loader for Astroline.
//!
//! Resolves the data directory, reads `config.toml` from it and deserializes
//! it into [`ServiceConfig`]. Falls back to defaults when the file is missing
//! or malformed.

use std::path::{Path, PathBuf};

use astroline_types::config::ServiceConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ASTROLINE_DATA_DIR";

/// Environment variable overriding the SQLite database URL.
pub const DATABASE_URL_ENV: &str = "ASTROLINE_DATABASE_URL";

const DATABASE_FILE: &str = "astroline.db";

/// Resolve the data directory.
///
/// Priority:
/// 1. `ASTROLINE_DATA_DIR` environment variable
/// 2. `~/.astroline`
/// 3. `./.astroline`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".astroline");
    }

    PathBuf::from(".astroline")
}

/// SQLite URL for the database file inside `data_dir`.
pub fn database_url_for(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE).display())
}

/// `ASTROLINE_DATABASE_URL` if set, else the database file in `data_dir`.
pub fn resolve_database_url(data_dir: &Path) -> String {
    std::env::var(DATABASE_URL_ENV).unwrap_or_else(|_| database_url_for(data_dir))
}

/// Load service configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`ServiceConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_service_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.chat.history_window, 5);
        assert_eq!(config.provider.timeout_secs, 30);
    }

    #[tokio::test]
    async fn load_service_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[chat]
history_window = 3

[provider]
model = "gemini-2.0-flash"
"#,
        )
        .await
        .unwrap();

        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.chat.history_window, 3);
        assert_eq!(config.provider.model, "gemini-2.0-flash");
        assert_eq!(config.provider.max_output_tokens, 1024);
    }

    #[tokio::test]
    async fn load_service_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "[chat\nhistory_window = ")
            .await
            .unwrap();

        let config = load_service_config(tmp.path()).await;
        assert_eq!(config.chat.history_window, 5);
    }

    #[test]
    fn database_url_points_into_data_dir() {
        let url = database_url_for(Path::new("/var/lib/astroline"));
        assert_eq!(url, "sqlite:///var/lib/astroline/astroline.db?mode=rwc");
    }
}
