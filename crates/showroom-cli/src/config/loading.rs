use crate::config::ShowroomConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "showroom.toml";

/// Values given on the command line; `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub docs_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
}

impl ShowroomConfig {
    /// Load configuration from multiple sources.
    ///
    /// Priority: CLI args > `SHOWROOM_*` environment variables > config file > defaults.
    /// Nested keys use a double underscore: `SHOWROOM_DEV_SERVER__PORT=8080`.
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        Self::figment(root, config_path, overrides)?
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()).into())
    }

    fn figment(
        root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    root.join(path)
                };
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = root.join(CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("SHOWROOM_").split("__"));

        if let Some(docs_dir) = &overrides.docs_dir {
            figment = figment.merge(Serialized::default("docs_dir", docs_dir));
        }
        if let Some(out_dir) = &overrides.out_dir {
            figment = figment.merge(Serialized::default("out_dir", out_dir));
        }
        if let Some(port) = overrides.port {
            figment = figment.merge(Serialized::default("dev_server.port", port));
        }
        if let Some(host) = &overrides.host {
            figment = figment.merge(Serialized::default("dev_server.host", host));
        }

        Ok(figment)
    }
}
