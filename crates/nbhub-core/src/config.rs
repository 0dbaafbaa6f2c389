//! Runtime configuration: file (TOML or YAML), then environment overrides.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::models::WorkspaceKind;
use super::session::AuthScheme;

pub const CONFIG_ENV: &str = "NBHUB_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub images: ImageConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Image names used when provisioning each workspace kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub jupyter: String,
    pub rstudio: String,
    pub restful: String,
    pub cron: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jupyter: "jupyter/minimal-notebook".to_string(),
            rstudio: "rocker/rstudio".to_string(),
            restful: "nbhub/restful".to_string(),
            cron: "nbhub/cron".to_string(),
        }
    }
}

impl ImageConfig {
    pub fn image_for(&self, kind: WorkspaceKind) -> &str {
        match kind {
            WorkspaceKind::Jupyter => &self.jupyter,
            WorkspaceKind::RStudio => &self.rstudio,
            WorkspaceKind::Restful => &self.restful,
            WorkspaceKind::Cron => &self.cron,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub auth_scheme: AuthScheme,
    /// Run the logout flow after any 401 response instead of only showing
    /// the failure banner.
    pub logout_on_unauthorized: bool,
}

pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("nbhub"))
        .unwrap_or_else(|| PathBuf::from(".nbhub"))
        .join("state.json")
}

impl AppConfig {
    /// Loads from `path`, or from `NBHUB_CONFIG`, or starts from defaults, then
    /// applies process environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Ok(serde_yaml::from_str(&contents)?)
        } else {
            Ok(toml::from_str(&contents)?)
        }
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = var("NBHUB_API_URL") {
            self.api.base_url = url;
        }
        if let Some(scheme) = var("NBHUB_AUTH_SCHEME") {
            self.session.auth_scheme = scheme
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    field: "session.auth_scheme",
                    reason,
                })?;
        }
        if let Some(path) = var("NBHUB_STATE_PATH") {
            self.storage.state_path = PathBuf::from(path);
        }
        if let Some(image) = var("NBHUB_IMAGE_JUPYTER") {
            self.images.jupyter = image;
        }
        if let Some(image) = var("NBHUB_IMAGE_RSTUDIO") {
            self.images.rstudio = image;
        }
        if let Some(image) = var("NBHUB_IMAGE_RESTFUL") {
            self.images.restful = image;
        }
        if let Some(image) = var("NBHUB_IMAGE_CRON") {
            self.images.cron = image;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        for (field, image) in [
            ("images.jupyter", &self.images.jupyter),
            ("images.rstudio", &self.images.rstudio),
            ("images.restful", &self.images.restful),
            ("images.cron", &self.images.cron),
        ] {
            if image.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.storage.state_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.state_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
