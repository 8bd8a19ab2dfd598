//! Shared helpers for command implementations.

use crate::config::{ConfigOverrides, ShowroomConfig};
use crate::error::{BuildError, CliError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Project root: `--cwd` when given, the current directory otherwise.
pub fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir().map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to get current directory: {}", e),
        ))
    })?;
    Ok(match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => current.join(dir),
        None => current,
    })
}

/// Load and validate the configuration of `root`.
pub fn load_config(
    root: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ShowroomConfig> {
    let config = ShowroomConfig::load(root, config_path, overrides)?;
    config.validate(root)?;
    Ok(config)
}

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|e| {
        BuildError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Make sure `out_dir` is a directory, creating it when missing.
pub fn ensure_output_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        fs::create_dir_all(out_dir)?;
    } else if !out_dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Output path exists but is not a directory: {}",
            out_dir.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_root_prefers_absolute_cwd() {
        let temp = TempDir::new().unwrap();
        assert_eq!(project_root(Some(temp.path())).unwrap(), temp.path());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/c.txt");
        write_file(&path, "hello").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_ensure_output_dir_rejects_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("out");
        fs::write(&file, "").unwrap();
        assert!(ensure_output_dir(&file).is_err());
        assert!(ensure_output_dir(&temp.path().join("fresh")).is_ok());
    }
}
