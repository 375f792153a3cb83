use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use pantry_core::session::SessionStore;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const API_URL_ENV: &str = "PANTRY_API_URL";

/// Optional `config.json` in the data directory.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub api_url: String,
}

impl Config {
    /// The API URL comes from `--api-url`, then `PANTRY_API_URL`, then
    /// `config.json`, then the local default.
    pub fn load(api_url_flag: Option<String>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "pantry").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Self::resolve(data_dir, api_url_flag, std::env::var(API_URL_ENV).ok())
    }

    fn resolve(
        data_dir: PathBuf,
        api_url_flag: Option<String>,
        api_url_env: Option<String>,
    ) -> Result<Self> {
        let api_url = match api_url_flag.or(api_url_env).filter(|u| !u.trim().is_empty()) {
            Some(url) => url,
            None => read_file_config(&data_dir)?
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };
        Ok(Config { data_dir, api_url })
    }

    pub fn session(&self) -> SessionStore {
        SessionStore::in_dir(&self.data_dir)
    }
}

fn read_file_config(data_dir: &Path) -> Result<FileConfig> {
    let path = data_dir.join("config.json");
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}
