//! Build-time discovery and precompilation of documentation code fences

use markdown::mdast::Node;
use tracing::{debug, info, warn};

use crate::compiler::Compiler;
use crate::error::{Result, ShowroomError};
use crate::language::SupportedLanguage;
use crate::result::CodeBlocks;

/// A fenced code block found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFence {
    pub lang: SupportedLanguage,
    pub source: String,
    /// 1-based line of the opening fence in the document.
    pub line: usize,
}

/// Flavour of the document being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    Mdx,
}

impl DocumentKind {
    /// Pick the flavour from a file extension; `None` for non-documents.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" | "markdown" => Some(DocumentKind::Markdown),
            "mdx" => Some(DocumentKind::Mdx),
            _ => None,
        }
    }

    fn parse_options(self) -> markdown::ParseOptions {
        let mut options = match self {
            DocumentKind::Markdown => markdown::ParseOptions::gfm(),
            DocumentKind::Mdx => markdown::ParseOptions::mdx(),
        };
        options.constructs.frontmatter = true;
        options
    }
}

/// Collect every fence whose language is in `accepted`, in document order.
pub fn extract_code_fences(
    document: &str,
    kind: DocumentKind,
    accepted: &[SupportedLanguage],
) -> Result<Vec<CodeFence>> {
    let tree = markdown::to_mdast(document, &kind.parse_options())
        .map_err(|e| ShowroomError::markdown(e.to_string()))?;

    let mut fences = Vec::new();
    collect_fences(&tree, accepted, &mut fences);
    Ok(fences)
}

fn collect_fences(node: &Node, accepted: &[SupportedLanguage], out: &mut Vec<CodeFence>) {
    if let Node::Code(code) = node {
        let lang = code
            .lang
            .as_deref()
            .and_then(SupportedLanguage::from_fence_info);
        if let Some(lang) = lang.filter(|lang| accepted.contains(lang)) {
            out.push(CodeFence {
                lang,
                source: code.value.clone(),
                line: code
                    .position
                    .as_ref()
                    .map(|position| position.start.line)
                    .unwrap_or(1),
            });
        }
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_fences(child, accepted, out);
        }
    }
}

/// Precompile every accepted fence of a document.
///
/// The first fence that fails to compile aborts with
/// [`ShowroomError::CodeBlock`]; documentation must not ship broken examples.
pub fn precompile_document(
    compiler: &Compiler,
    document: &str,
    kind: DocumentKind,
    accepted: &[SupportedLanguage],
) -> Result<CodeBlocks> {
    let fences = extract_code_fences(document, kind, accepted)?;
    let mut blocks = CodeBlocks::new();

    for fence in fences {
        // Blocks are keyed by source text, so the first fence of a source wins.
        if let Some(existing) = blocks.get(&fence.source) {
            match existing.as_ref().map(|success| success.lang) {
                Some(first) if first != fence.lang => warn!(
                    line = fence.line,
                    %first,
                    lang = %fence.lang,
                    "identical code block fenced in another language; keeping the first"
                ),
                _ => debug!(line = fence.line, "skipping duplicate code block"),
            }
            continue;
        }
        match compiler.precompile(&fence.source, fence.lang) {
            Ok(success) => {
                blocks.insert(fence.source, Some(success));
            }
            Err(failure) => {
                return Err(ShowroomError::CodeBlock {
                    line: fence.line,
                    lang: fence.lang.to_string(),
                    error_line: failure.line(),
                    message: failure.error,
                });
            }
        }
    }

    info!(blocks = blocks.len(), "precompiled code blocks");
    Ok(blocks)
}
