use crate::constants::{self, limits};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub video: VideoConfig,

    pub ffmpeg: FfmpegConfig,

    pub thumbnails: ThumbnailConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Forces debug logging. Also set by `APP_DEBUG=true`.
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub bind_address: String,

    pub cors_allowed_origins: Vec<String>,

    /// Directory served under `/static`.
    pub static_dir: String,

    /// How long in-flight requests may take to finish after a shutdown signal.
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            static_dir: "web/static".to_string(),
            shutdown_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_path: String,

    pub uploads: String,

    pub temp: String,

    pub logs: String,

    pub thumbnails: String,

    pub metadata: String,
}

impl StorageConfig {
    /// Every directory under `base`, using the default names.
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let dir = |name: &str| base.join(name).to_string_lossy().into_owned();

        Self {
            base_path: base.to_string_lossy().into_owned(),
            uploads: dir("uploads"),
            temp: dir("temp"),
            logs: dir("logs"),
            thumbnails: dir("thumbnails"),
            metadata: dir("metadata"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::rooted_at("storage")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Maximum upload size in bytes.
    pub max_size: u64,

    pub allowed_types: Vec<String>,

    pub allowed_extensions: Vec<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_size: limits::MAX_UPLOAD_BYTES,
            allowed_types: constants::VIDEO_CONTENT_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
            allowed_extensions: constants::VIDEO_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Absolute path, or a bare name looked up on `PATH`.
    pub path: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            path: "ffmpeg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub workers: usize,

    /// Jobs beyond this many are dropped rather than queued.
    pub queue_capacity: usize,

    pub timestamp_seconds: f64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
            timestamp_seconds: constants::thumbnails::TIMESTAMP_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the first config file found, or defaults, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_override(None)
    }

    /// Like [`Config::load`], but reads `path` instead of searching when given.
    pub fn load_with_override(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_file()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Applies `GOOJI_PORT` and `APP_DEBUG`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("GOOJI_PORT")
            && !port.trim().is_empty()
        {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid GOOJI_PORT value: {port}"))?;
        }

        if let Some(debug) = lookup("APP_DEBUG") {
            self.general.debug = matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gooji").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gooji").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes a default config at `path` unless one exists. Returns whether a
    /// file was created.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Effective log filter directive.
    #[must_use]
    pub fn log_level(&self) -> &str {
        if self.general.debug {
            "debug"
        } else {
            &self.general.log_level
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.video.max_size == 0 {
            anyhow::bail!("video.max_size must be > 0");
        }

        if self.video.allowed_types.is_empty() {
            anyhow::bail!("video.allowed_types cannot be empty");
        }

        if self.video.allowed_extensions.is_empty() {
            anyhow::bail!("video.allowed_extensions cannot be empty");
        }

        if self.ffmpeg.path.trim().is_empty() {
            anyhow::bail!("ffmpeg.path cannot be empty");
        }

        if self.thumbnails.workers == 0 {
            anyhow::bail!("thumbnails.workers must be > 0");
        }

        if self.thumbnails.queue_capacity == 0 {
            anyhow::bail!("thumbnails.queue_capacity must be > 0");
        }

        if !self.thumbnails.timestamp_seconds.is_finite() || self.thumbnails.timestamp_seconds < 0.0
        {
            anyhow::bail!("thumbnails.timestamp_seconds must be a non-negative number");
        }

        Ok(())
    }
}
