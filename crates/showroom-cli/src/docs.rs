//! Documentation scanning and build-time precompilation of code blocks.

use crate::error::{BuildError, CliError, Result};
use crate::ui::DocsProgress;
use showroom_compiler::{
    CodeBlocksManifest, Compiler, DocumentCodeBlocks, DocumentKind, ShowroomError,
    SupportedLanguage, precompile_document,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories never scanned for documents.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist"];

/// Every `.md`/`.mdx` file under `root`, sorted for reproducible output.
pub fn scan_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(BuildError::DocsNotFound(root.to_path_buf()).into());
    }

    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = entry.map_err(|e| CliError::Custom(format!("Failed to scan docs: {}", e)))?;
        if entry.file_type().is_file() && document_kind(entry.path()).is_some() {
            documents.push(entry.into_path());
        }
    }

    documents.sort();
    debug!(count = documents.len(), root = %root.display(), "scanned documentation");
    Ok(documents)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Markdown flavour of a document, by extension.
pub fn document_kind(path: &Path) -> Option<DocumentKind> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentKind::from_extension)
}

/// Manifest path of a document: relative to the docs root, `/`-separated.
pub fn manifest_path(root: &Path, document: &Path) -> String {
    let relative = document.strip_prefix(root).unwrap_or(document);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Precompile one document's code blocks.
pub fn compile_document(
    compiler: &Compiler,
    root: &Path,
    document: &Path,
    accepted: &[SupportedLanguage],
) -> Result<DocumentCodeBlocks> {
    let kind = document_kind(document).ok_or_else(|| BuildError::Document {
        document: document.to_path_buf(),
        reason: "not a .md or .mdx file".to_string(),
    })?;
    let source = std::fs::read_to_string(document)?;

    let blocks = precompile_document(compiler, &source, kind, accepted).map_err(|err| {
        match err {
            ShowroomError::CodeBlock {
                line,
                lang,
                message,
                ..
            } => BuildError::CodeBlock {
                document: document.to_path_buf(),
                line,
                error: format!("[{}] {}", lang, message),
            },
            other => BuildError::Document {
                document: document.to_path_buf(),
                reason: other.to_string(),
            },
        }
    })?;

    Ok(DocumentCodeBlocks {
        path: manifest_path(root, document),
        blocks,
    })
}

/// Precompile every document under `root`, aborting on the first failure.
///
/// Documents without accepted code blocks are left out of the manifest.
pub fn precompile_all(
    compiler: &Compiler,
    root: &Path,
    accepted: &[SupportedLanguage],
) -> Result<CodeBlocksManifest> {
    let documents = scan_documents(root)?;
    let progress = DocsProgress::new(documents.len());
    let mut manifest = CodeBlocksManifest::default();

    for document in &documents {
        progress.start(&manifest_path(root, document));
        match compile_document(compiler, root, document, accepted) {
            Ok(item) => {
                if !item.blocks.is_empty() {
                    manifest.items.push(item);
                }
            }
            Err(err) => {
                progress.fail("Precompilation failed");
                return Err(err);
            }
        }
        progress.advance();
    }

    progress.finish(&format!(
        "Precompiled {} code blocks from {} documents",
        manifest.block_count(),
        documents.len()
    ));
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_compiler::{CompilerOptions, PackageMap};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn compiler() -> Compiler {
        Compiler::new(Arc::new(PackageMap::new()), CompilerOptions::default()).unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scan_finds_markdown_and_skips_ignored_dirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "intro.md", "# Intro");
        write(temp.path(), "components/button.mdx", "# Button");
        write(temp.path(), "node_modules/pkg/readme.md", "# no");
        write(temp.path(), ".cache/page.md", "# no");
        write(temp.path(), "notes.txt", "no");

        let docs = scan_documents(temp.path()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| manifest_path(temp.path(), d)).collect();
        assert_eq!(names, vec!["components/button.mdx", "intro.md"]);
    }

    #[test]
    fn missing_docs_dir_is_a_build_error() {
        let temp = TempDir::new().unwrap();
        let err = scan_documents(&temp.path().join("docs")).unwrap_err();
        assert!(matches!(err, CliError::Build(BuildError::DocsNotFound(_))));
    }

    #[test]
    fn precompile_all_collects_blocks_per_document() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "button.md",
            "# Button\n\n```jsx\n<button>Save</button>\n```\n\n```css\n.a {}\n```\n",
        );
        write(temp.path(), "empty.md", "# Nothing to run\n");

        let manifest =
            precompile_all(&compiler(), temp.path(), &SupportedLanguage::ALL).unwrap();
        assert_eq!(manifest.items.len(), 1);
        assert_eq!(manifest.items[0].path, "button.md");
        assert_eq!(manifest.block_count(), 1);

        let success = manifest.items[0]
            .blocks
            .get("<button>Save</button>")
            .unwrap()
            .as_ref()
            .unwrap();
        assert_eq!(success.message_id, -1);
        assert!(success.initial_code_hash.is_some());
    }

    #[test]
    fn broken_block_names_document_and_line() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "broken.md",
            "# Broken\n\nSome text.\n\n```js\nconst a = 'oops;\n```\n",
        );

        let err = precompile_all(&compiler(), temp.path(), &SupportedLanguage::ALL).unwrap_err();
        match err {
            CliError::Build(BuildError::CodeBlock {
                document, line, error,
            }) => {
                assert!(document.ends_with("broken.md"));
                assert_eq!(line, 5);
                assert!(error.starts_with("[js]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
