//! PackageMap: the fixed universe of modules importable from live-edited code

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShowroomError};

/// One declared import, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportConfig {
    /// A package specifier resolved by the host (`"acme-ui"`).
    Package(String),
    /// A named module backed by a local path or a different specifier.
    Local { name: String, path: String },
}

impl ImportConfig {
    pub fn name(&self) -> &str {
        match self {
            ImportConfig::Package(name) => name,
            ImportConfig::Local { name, .. } => name,
        }
    }
}

/// Resolved registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub name: String,
    pub var_name: String,
    pub path: String,
}

/// Package name → entry, in declaration order.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageMap {
    entries: IndexMap<String, PackageEntry>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from configured imports.
    ///
    /// Local paths are resolved against `root`; bare package specifiers are kept.
    pub fn from_imports(imports: &[ImportConfig], root: &Path) -> Result<Self> {
        let mut map = Self::new();
        for import in imports {
            let entry = match import {
                ImportConfig::Package(name) => PackageEntry {
                    name: name.clone(),
                    var_name: safe_name(name),
                    path: name.clone(),
                },
                ImportConfig::Local { name, path } => {
                    if path.trim().is_empty() {
                        return Err(ShowroomError::invalid_package(name, "path must not be empty"));
                    }
                    let path = if is_package_specifier(path) {
                        path.clone()
                    } else {
                        path_clean::clean(root.join(path))
                            .to_string_lossy()
                            .into_owned()
                    };
                    PackageEntry {
                        name: name.clone(),
                        var_name: safe_name(name),
                        path,
                    }
                }
            };
            map.insert(entry)?;
        }
        Ok(map)
    }

    /// Register an entry, rejecting empty names and name or variable clashes.
    pub fn insert(&mut self, entry: PackageEntry) -> Result<()> {
        if entry.name.trim().is_empty() {
            return Err(ShowroomError::invalid_package(
                entry.name,
                "package name must not be empty",
            ));
        }
        if entry.var_name.len() <= 1 {
            return Err(ShowroomError::invalid_package(
                entry.name,
                "package name has no identifier characters",
            ));
        }
        if self.entries.contains_key(&entry.name) {
            return Err(ShowroomError::DuplicatePackage {
                name: entry.name,
                other: None,
            });
        }
        if let Some(other) = self
            .entries
            .values()
            .find(|existing| existing.var_name == entry.var_name)
        {
            return Err(ShowroomError::DuplicatePackage {
                name: entry.name,
                other: Some(other.name.clone()),
            });
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageEntry> {
        self.entries.values()
    }

    /// Render the bootstrap module that loads every package namespace and
    /// registers it on an `imports` object under its variable name.
    pub fn imports_attach(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.values() {
            out.push_str(&format!(
                "import * as {} from {};\n",
                entry.var_name,
                quote(&entry.path)
            ));
        }
        out.push_str("export const imports = {};\n");
        for entry in self.entries.values() {
            out.push_str(&format!("imports.{0} = {0};\n", entry.var_name));
        }
        out
    }
}

/// Derive the variable a package is bound to inside executed snippets.
///
/// Every run of non-identifier characters is a word break; the words are joined
/// in camelCase and prefixed with `_`.
pub fn safe_name(name: &str) -> String {
    let mut out = String::from("_");
    let mut first = true;
    for word in name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            if first {
                out.push(head.to_ascii_lowercase());
            } else {
                out.push(head.to_ascii_uppercase());
            }
            out.extend(chars);
            first = false;
        }
    }
    out
}

fn is_package_specifier(path: &str) -> bool {
    !path.is_empty() && path.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("'{}'", value))
}
