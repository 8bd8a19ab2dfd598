//! The synchronous compiler backend
//!
//! `source → parse → semantic → transform (TS strip, classic JSX, target
//! lowering) → codegen → import rewrite`. A compile never panics on user
//! input and never returns a Rust error: failures are [`CompileResult::Error`].

use std::path::Path;
use std::sync::Arc;

use bon::Builder;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use tracing::{debug, trace};

use crate::diagnostic;
use crate::error::{Result, ShowroomError};
use crate::language::SupportedLanguage;
use crate::packages::PackageMap;
use crate::result::{
    CompileFailure, CompileResult, CompileSuccess, FeatureDescriptor, MessageId,
    PRECOMPILED_MESSAGE_ID,
};
use crate::rewrite::{self, RewriteOptions};

/// Function the preview frame exposes for rendering a snippet's final expression.
pub const RENDER_CALLEE: &str = "render";

/// Function the preview frame exposes for mounting raw markup.
pub const RENDER_HTML_CALLEE: &str = "renderHtml";

#[derive(Debug, Clone, Builder)]
pub struct CompilerOptions {
    /// ECMAScript level the output is lowered to.
    #[builder(default = "es2018".to_string(), into)]
    pub target: String,

    #[builder(default = "React.createElement".to_string(), into)]
    pub jsx_factory: String,

    #[builder(default = "React.Fragment".to_string(), into)]
    pub jsx_fragment: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Compiles snippets against one immutable PackageMap.
///
/// Holds no per-call state; one instance can serve any number of compiles.
#[derive(Debug)]
pub struct Compiler {
    packages: Arc<PackageMap>,
    transform: TransformOptions,
}

impl Compiler {
    pub fn new(packages: Arc<PackageMap>, options: CompilerOptions) -> Result<Self> {
        let mut transform = TransformOptions::from_target(&options.target).map_err(|reason| {
            ShowroomError::InvalidTarget {
                target: options.target.clone(),
                reason,
            }
        })?;
        transform.jsx = JsxOptions {
            runtime: JsxRuntime::Classic,
            pragma: Some(options.jsx_factory.clone()),
            pragma_frag: Some(options.jsx_fragment.clone()),
            ..JsxOptions::default()
        };
        // Unused value imports still load their package.
        transform.typescript.only_remove_type_imports = true;

        debug!(
            target = %options.target,
            packages = packages.len(),
            "compiler initialized"
        );

        Ok(Self {
            packages,
            transform,
        })
    }

    /// Compile one snippet for a caller.
    pub fn compile(&self, source: &str, lang: SupportedLanguage, message_id: MessageId) -> CompileResult {
        match self.transpile(source, lang) {
            Ok(code) => {
                let render_callee = (lang.is_script() && !lang.is_non_visual())
                    .then(|| RENDER_CALLEE.to_string());
                let output = rewrite::rewrite(
                    &code,
                    &self.packages,
                    &RewriteOptions { render_callee },
                );
                let features = detect_features(&output.import_names);
                trace!(message_id, %lang, bytes = output.code.len(), "compiled snippet");
                CompileResult::Success(CompileSuccess {
                    code: output.code,
                    message_id,
                    import_names: output.import_names,
                    imported_packages: output.imported_packages,
                    lang,
                    features,
                    initial_code_hash: None,
                    unresolved_packages: output.unresolved,
                })
            }
            Err(raw) => {
                debug!(message_id, %lang, "snippet failed to compile");
                CompileResult::Error(diagnostic::normalize(&raw, message_id))
            }
        }
    }

    /// Build-time variant: success carries the code hash, failure is returned
    /// for the caller to abort on.
    pub fn precompile(
        &self,
        source: &str,
        lang: SupportedLanguage,
    ) -> std::result::Result<CompileSuccess, CompileFailure> {
        match self.compile(source, lang, PRECOMPILED_MESSAGE_ID) {
            CompileResult::Success(mut success) => {
                success.initial_code_hash = Some(code_hash(source));
                Ok(success)
            }
            CompileResult::Error(failure) => Err(failure),
        }
    }

    /// Transpile to plain JavaScript, returning raw transform-failure text on error.
    fn transpile(&self, source: &str, lang: SupportedLanguage) -> std::result::Result<String, String> {
        if !lang.is_script() {
            let markup = serde_json::to_string(source).map_err(|e| e.to_string())?;
            return Ok(format!("{}({});\n", RENDER_HTML_CALLEE, markup));
        }

        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, lang.source_type()).parse();
        if !parsed.errors.is_empty() {
            return Err(diagnostic::render_failure(source, &parsed.errors));
        }
        let mut program = parsed.program;

        let semantic = SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&program);
        if !semantic.errors.is_empty() {
            return Err(diagnostic::render_failure(source, &semantic.errors));
        }
        let scoping = semantic.semantic.into_scoping();

        let transformed = Transformer::new(
            &allocator,
            Path::new(lang.virtual_filename()),
            &self.transform,
        )
        .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return Err(diagnostic::render_failure(source, &transformed.errors));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

/// Short stable hash identifying a snippet's original source.
pub fn code_hash(source: &str) -> String {
    blake3::hash(source.as_bytes()).to_hex()[..12].to_string()
}

fn detect_features(import_names: &[String]) -> Vec<FeatureDescriptor> {
    let imports = |name: &str| import_names.iter().any(|n| n == name);
    let mut features = Vec::new();
    if imports("usePropsEditor") {
        features.push(FeatureDescriptor::PropsEditor {
            has_render_editor: imports("PropsEditor"),
        });
    }
    if imports("useUnionProps") {
        features.push(FeatureDescriptor::UnionProps);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::ImportConfig;

    fn compiler() -> Compiler {
        let packages = PackageMap::from_imports(
            &[
                ImportConfig::Package("acme-ui".into()),
                ImportConfig::Package("react".into()),
            ],
            Path::new("/"),
        )
        .unwrap();
        Compiler::new(Arc::new(packages), CompilerOptions::default()).unwrap()
    }

    fn success(result: CompileResult) -> CompileSuccess {
        match result {
            CompileResult::Success(success) => success,
            CompileResult::Error(failure) => panic!("expected success, got {:?}", failure),
        }
    }

    fn failure(result: CompileResult) -> CompileFailure {
        match result {
            CompileResult::Error(failure) => failure,
            CompileResult::Success(success) => panic!("expected error, got {:?}", success),
        }
    }

    #[test]
    fn jsx_uses_the_configured_factory() {
        let out = success(compiler().compile("const x = <div>hi</div>", SupportedLanguage::Jsx, 1));
        assert!(out.code.contains("React.createElement("), "{}", out.code);
        assert!(out.imported_packages.is_empty());
        assert_eq!(out.message_id, 1);
        assert_eq!(out.lang, SupportedLanguage::Jsx);
    }

    #[test]
    fn registered_imports_are_rewritten() {
        let out = success(compiler().compile(
            "import { Button } from 'acme-ui';\n<Button />",
            SupportedLanguage::Tsx,
            2,
        ));
        assert!(out.code.contains("_acmeUi"), "{}", out.code);
        assert!(!out.code.contains("'acme-ui'"));
        assert!(!out.code.contains("\"acme-ui\""));
        assert_eq!(out.imported_packages, vec!["acme-ui"]);
        assert_eq!(out.import_names, vec!["Button"]);
        assert!(out.code.contains("render("), "{}", out.code);
    }

    #[test]
    fn typescript_annotations_are_stripped() {
        let out = success(compiler().compile(
            "const n: number = 1;\nconsole.log(n as number);\n",
            SupportedLanguage::Ts,
            3,
        ));
        assert!(!out.code.contains(": number"));
        assert!(!out.code.contains("render("), "non-visual snippets are not rendered");
    }

    #[test]
    fn unterminated_string_reports_its_line() {
        let out = failure(compiler().compile(
            "const a = 1;\nconst s = \"abc;\n",
            SupportedLanguage::Js,
            4,
        ));
        assert_eq!(out.line(), Some(2));
        assert!(!out.error.contains("<stdin>"));
        assert_eq!(out.message_id, 4);
    }

    #[test]
    fn unclosed_brace_reports_its_line() {
        let out = failure(compiler().compile(
            "const a = 1;\nfunction f() {",
            SupportedLanguage::Tsx,
            5,
        ));
        assert_eq!(out.line(), Some(2));
    }

    #[test]
    fn html_is_passed_through() {
        let out = success(compiler().compile("<p>Hello</p>", SupportedLanguage::Html, 6));
        assert_eq!(out.code, "renderHtml(\"<p>Hello</p>\");\n");
    }

    #[test]
    fn features_follow_imports() {
        let out = success(compiler().compile(
            "import { usePropsEditor, PropsEditor, useUnionProps } from 'acme-ui';\n",
            SupportedLanguage::Tsx,
            7,
        ));
        assert_eq!(
            out.features,
            vec![
                FeatureDescriptor::PropsEditor {
                    has_render_editor: true
                },
                FeatureDescriptor::UnionProps
            ]
        );
    }

    #[test]
    fn precompile_hashes_the_source() {
        let out = compiler()
            .precompile("<div />", SupportedLanguage::Jsx)
            .unwrap();
        assert_eq!(out.message_id, PRECOMPILED_MESSAGE_ID);
        assert_eq!(out.initial_code_hash.as_deref(), Some(code_hash("<div />").as_str()));
        assert_eq!(code_hash("<div />").len(), 12);

        assert!(compiler().precompile("<div", SupportedLanguage::Jsx).is_err());
    }

    #[test]
    fn rejects_unknown_target() {
        let options = CompilerOptions::builder().target("es1999").build();
        assert!(matches!(
            Compiler::new(Arc::new(PackageMap::new()), options),
            Err(ShowroomError::InvalidTarget { .. })
        ));
    }
}
