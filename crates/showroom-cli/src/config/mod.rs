//! Configuration system with multi-source loading.
//!
//! Merges settings from CLI args, environment variables and `showroom.toml`.
//! Priority: CLI > Environment > File > Defaults

mod loading;
mod validation;

pub use loading::{CONFIG_FILE, ConfigOverrides};

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use showroom_compiler::{CompilerOptions, ImportConfig, PackageMap, SupportedLanguage};
use showroom_runtime::FrameConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CliError, ConfigError, Result};

/// Showroom configuration, loaded from showroom.toml.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ShowroomConfig {
    /// Root scanned for *.md and *.mdx documents
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Build output directory
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Modules importable from examples
    #[serde(default)]
    pub imports: Vec<ImportSpec>,

    /// Languages compiled live; fences in other languages are left alone
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// ECMAScript target for compiled snippets
    #[serde(default = "default_target")]
    pub target: String,

    /// JSX element factory
    #[serde(default = "default_jsx_factory")]
    pub jsx_factory: String,

    /// JSX fragment component
    #[serde(default = "default_jsx_fragment")]
    pub jsx_fragment: String,

    /// Quiet period after the last edit before compiling, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Classic scripts loaded into every preview frame (e.g. a UMD React build)
    #[serde(default)]
    pub frame_scripts: Vec<String>,

    /// Browser import map injected into preview frames
    #[serde(default)]
    pub import_map: BTreeMap<String, String>,

    /// Development server settings
    #[serde(default)]
    pub dev_server: DevServerConfig,
}

/// One `imports` entry: a package name or a `{ name, path }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ImportSpec {
    /// Package resolved by name ("acme-ui")
    Package(String),
    /// Named module backed by a local path
    Local {
        /// Specifier used in examples
        name: String,
        /// Package specifier or path relative to the project root
        path: String,
    },
}

impl From<&ImportSpec> for ImportConfig {
    fn from(spec: &ImportSpec) -> Self {
        match spec {
            ImportSpec::Package(name) => ImportConfig::Package(name.clone()),
            ImportSpec::Local { name, path } => ImportConfig::Local {
                name: name.clone(),
                path: path.clone(),
            },
        }
    }
}

/// `[dev_server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DevServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for ShowroomConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            out_dir: default_out_dir(),
            imports: Vec::new(),
            languages: default_languages(),
            target: default_target(),
            jsx_factory: default_jsx_factory(),
            jsx_fragment: default_jsx_fragment(),
            debounce_ms: default_debounce_ms(),
            frame_scripts: Vec::new(),
            import_map: BTreeMap::new(),
            dev_server: DevServerConfig::default(),
        }
    }
}

impl ShowroomConfig {
    /// JSON Schema for showroom.toml.
    pub fn json_schema() -> Result<serde_json::Value> {
        Ok(serde_json::to_value(schemars::schema_for!(ShowroomConfig))?)
    }

    /// Languages accepted for live compilation.
    pub fn accepted_languages(&self) -> Result<Vec<SupportedLanguage>> {
        self.languages
            .iter()
            .map(|lang| {
                lang.parse::<SupportedLanguage>()
                    .map_err(|_| {
                        CliError::from(ConfigError::InvalidValue {
                            field: "languages".to_string(),
                            value: lang.clone(),
                            hint: "Supported languages are js, jsx, ts, tsx and html".to_string(),
                        })
                    })
            })
            .collect()
    }

    /// Build the PackageMap, resolving local paths against `root`.
    pub fn package_map(&self, root: &Path) -> Result<PackageMap> {
        let imports: Vec<ImportConfig> = self.imports.iter().map(ImportConfig::from).collect();
        Ok(PackageMap::from_imports(&imports, root)?)
    }

    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions::builder()
            .target(self.target.clone())
            .jsx_factory(self.jsx_factory.clone())
            .jsx_fragment(self.jsx_fragment.clone())
            .build()
    }

    /// Static inputs of every preview frame.
    pub fn frame_config(&self, packages: Arc<PackageMap>) -> FrameConfig {
        let import_map: IndexMap<String, String> = self
            .import_map
            .iter()
            .map(|(specifier, url)| (specifier.clone(), url.clone()))
            .collect();
        FrameConfig::builder()
            .packages(packages)
            .import_map(import_map)
            .frame_scripts(self.frame_scripts.clone())
            .build()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Documentation root, resolved against the project root.
    pub fn docs_root(&self, root: &Path) -> PathBuf {
        resolve(&self.docs_dir, root)
    }

    /// Output directory, resolved against the project root.
    pub fn out_root(&self, root: &Path) -> PathBuf {
        resolve(&self.out_dir, root)
    }
}

fn resolve(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("showroom")
}

fn default_languages() -> Vec<String> {
    SupportedLanguage::ALL
        .iter()
        .map(|lang| lang.as_str().to_string())
        .collect()
}

fn default_target() -> String {
    "es2018".to_string()
}

fn default_jsx_factory() -> String {
    "React.createElement".to_string()
}

fn default_jsx_fragment() -> String {
    "React.Fragment".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_port() -> u16 {
    6969
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
