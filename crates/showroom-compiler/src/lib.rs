//! # showroom-compiler
//!
//! Turns documentation snippets (`js`, `jsx`, `ts`, `tsx`, `html`) into
//! JavaScript that a sandboxed preview frame can execute.
//!
//! - [`Compiler`] transpiles with OXC and reports failures as data
//! - [`rewrite_imports`] binds imports of registered packages to host variables
//! - [`PackageMap`] is the fixed registry of importable packages
//! - [`precompile_document`] seeds [`CodeBlocks`] at build time
//!
//! ```no_run
//! use std::sync::Arc;
//! use showroom_compiler::{Compiler, CompilerOptions, PackageMap, SupportedLanguage};
//!
//! let compiler = Compiler::new(Arc::new(PackageMap::new()), CompilerOptions::default())?;
//! let result = compiler.compile("<div>hi</div>", SupportedLanguage::Jsx, 1);
//! assert!(result.is_success());
//! # Ok::<(), showroom_compiler::ShowroomError>(())
//! ```

pub mod codeblocks;
pub mod compiler;
pub mod diagnostic;
pub mod error;
pub mod language;
pub mod packages;
pub mod result;
pub mod rewrite;

pub use codeblocks::{CodeFence, DocumentKind, extract_code_fences, precompile_document};
pub use compiler::{
    Compiler, CompilerOptions, RENDER_CALLEE, RENDER_HTML_CALLEE, code_hash,
};
pub use error::{Result, ShowroomError};
pub use language::SupportedLanguage;
pub use packages::{ImportConfig, PackageEntry, PackageMap, safe_name};
pub use result::{
    CacheKey, CodeBlocks, CodeBlocksManifest, CompileFailure, CompileRequest, CompileResult,
    CompileSuccess, DocumentCodeBlocks, ErrorMeta, FeatureDescriptor, MessageId,
    PRECOMPILED_MESSAGE_ID, cache_key,
};
pub use rewrite::{RewriteOptions, RewriteOutput, rewrite, rewrite_imports};
