use crate::config::ShowroomConfig;
use crate::error::{ConfigError, Result};
use std::path::Path;

impl ShowroomConfig {
    /// Validate configuration for logical consistency.
    ///
    /// Import entries are checked by building the PackageMap, so a config that
    /// passes here can be served or built without further configuration errors.
    pub fn validate(&self, root: &Path) -> Result<()> {
        if self.docs_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "docs_dir".to_string(),
                value: String::new(),
                hint: "Point docs_dir at the directory holding your .md/.mdx files".to_string(),
            }
            .into());
        }

        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms".to_string(),
                value: "0".to_string(),
                hint: "Use a positive number of milliseconds (default 300)".to_string(),
            }
            .into());
        }

        if self.languages.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "languages".to_string(),
                value: "[]".to_string(),
                hint: "Enable at least one of js, jsx, ts, tsx, html".to_string(),
            }
            .into());
        }
        self.accepted_languages()?;

        if self.dev_server.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dev_server.host".to_string(),
                value: String::new(),
                hint: "Use an address such as 127.0.0.1".to_string(),
            }
            .into());
        }

        self.package_map(root)?;
        Ok(())
    }
}
