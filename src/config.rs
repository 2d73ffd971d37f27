use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sources::kugou::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DownloadConfig {
    pub directory: Option<PathBuf>,
}

impl DownloadConfig {
    /// 설정된 디렉토리, 없으면 시스템 다운로드 폴더, 그것도 없으면 현재 디렉토리.
    pub fn resolve_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .filter(|d| !d.as_os_str().is_empty())
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("musicdl")
        .join("config.toml")
}

pub fn load_config() -> Config {
    load_from(&config_path())
}

fn load_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("설정 파일을 읽을 수 없어 기본값을 사용합니다: {}", e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    save_to(&config_path(), config)
}

fn save_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("설정 파일을 쓸 수 없습니다: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = load_from(Path::new("/definitely/not/here/config.toml"));
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
        assert!(cfg.download.directory.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[download]\ndirectory = \"/tmp/music\"\n").unwrap();
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.download.resolve_directory(), PathBuf::from("/tmp/music"));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("musicdl-config-{}", std::process::id()))
            .join("config.toml");
        let mut cfg = Config::default();
        cfg.api.base_url = "http://mirror.test/api.php".to_string();

        save_to(&path, &cfg).unwrap();
        let reloaded = load_from(&path);
        assert_eq!(reloaded.api.base_url, "http://mirror.test/api.php");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
