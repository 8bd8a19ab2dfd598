//! Import rewriting against the PackageMap
//!
//! Compiled snippets must not trigger real module resolution for registered
//! packages. Each static import of a registered specifier becomes a plain
//! binding to the package's variable, which the preview frame puts in scope:
//!
//! ```text
//! import Foo, { Button as B } from 'acme-ui';   →   const Foo = _acmeUi.default; const { Button: B } = _acmeUi;
//! import * as ui from 'acme-ui';                 →   const ui = _acmeUi;
//! import 'acme-ui/styles';                       →   (removed when registered)
//! require('acme-ui')                             →   _acmeUi
//! import('acme-ui')                              →   Promise.resolve(_acmeUi)
//! export { Button, default as Foo } from 'acme-ui' → const { Button } = _acmeUi; const Foo = _acmeUi.default;
//! export * as ui from 'acme-ui';                 →   const ui = _acmeUi;
//! export * from 'acme-ui';                       →   (removed when registered)
//! ```
//!
//! Snippets run as a function body, so re-exports only keep their bindings.
//!
//! Specifiers outside the map are left untouched and reported; they fail when
//! the snippet executes. The rewrite is idempotent because its output contains
//! no import of a registered specifier.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use tracing::{debug, warn};

use crate::packages::{PackageEntry, PackageMap};

/// Options for [`rewrite`].
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Wrap the program's trailing expression statement as `callee(expr);`.
    pub render_callee: Option<String>,
}

/// Rewritten code plus what the snippet imported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutput {
    pub code: String,
    /// Local binding names introduced by rewritten imports.
    pub import_names: Vec<String>,
    /// Registered specifiers the snippet referenced.
    pub imported_packages: Vec<String>,
    /// Bare specifiers not present in the map.
    pub unresolved: Vec<String>,
}

/// Rewrite every registered import in `code`.
pub fn rewrite_imports(code: &str, packages: &PackageMap) -> String {
    rewrite(code, packages, &RewriteOptions::default()).code
}

/// Rewrite imports and collect what the snippet imported.
///
/// `code` must be plain JavaScript. If it cannot be parsed it is returned
/// unchanged; the failure then surfaces when the snippet executes.
pub fn rewrite(code: &str, packages: &PackageMap, options: &RewriteOptions) -> RewriteOutput {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        warn!(
            errors = ret.errors.len(),
            "compiled output could not be parsed, skipping import rewrite"
        );
        return RewriteOutput {
            code: code.to_string(),
            ..RewriteOutput::default()
        };
    }

    let mut collector = ImportCollector::new(packages);
    walk::walk_program(&mut collector, &ret.program);

    if let Some(callee) = options.render_callee.as_deref() {
        if let Some(Statement::ExpressionStatement(stmt)) = ret.program.body.last() {
            let span = stmt.expression.span();
            collector.edits.push(Edit::insert(span.end, ")".to_string()));
            collector
                .edits
                .push(Edit::insert(span.start, format!("{}(", callee)));
        }
    }

    let ImportCollector {
        edits,
        import_names,
        imported_packages,
        unresolved,
        ..
    } = collector;

    if !unresolved.is_empty() {
        warn!(?unresolved, "snippet imports packages that are not registered");
    }
    debug!(edits = edits.len(), ?imported_packages, "rewrote imports");

    RewriteOutput {
        code: apply_edits(code, edits),
        import_names,
        imported_packages,
        unresolved,
    }
}

/// Replacement of `start..end` with `text`.
#[derive(Debug)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

impl Edit {
    fn replace(span: oxc_span::Span, text: String) -> Self {
        Self {
            start: span.start,
            end: span.end,
            text,
        }
    }

    fn insert(at: u32, text: String) -> Self {
        Self {
            start: at,
            end: at,
            text,
        }
    }
}

/// Apply edits back to front so earlier offsets stay valid.
///
/// At equal starts the wider edit goes first, so an insertion lands before a
/// replacement that begins at the same offset.
fn apply_edits(code: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    let mut out = code.to_string();
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if start <= end && end <= out.len() {
            out.replace_range(start..end, &edit.text);
        }
    }
    out
}

struct ImportCollector<'p> {
    packages: &'p PackageMap,
    edits: Vec<Edit>,
    import_names: Vec<String>,
    imported_packages: Vec<String>,
    unresolved: Vec<String>,
}

impl<'p> ImportCollector<'p> {
    fn new(packages: &'p PackageMap) -> Self {
        Self {
            packages,
            edits: Vec::new(),
            import_names: Vec::new(),
            imported_packages: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    fn resolve(&mut self, specifier: &str) -> Option<&'p PackageEntry> {
        match self.packages.get(specifier) {
            Some(entry) => {
                if !self.imported_packages.iter().any(|p| p == specifier) {
                    self.imported_packages.push(specifier.to_string());
                }
                Some(entry)
            }
            None => {
                if is_bare_specifier(specifier) && !self.unresolved.iter().any(|p| p == specifier)
                {
                    self.unresolved.push(specifier.to_string());
                }
                None
            }
        }
    }

    fn bindings(&mut self, decl: &ImportDeclaration<'_>, var_name: &str) -> String {
        let Some(specifiers) = &decl.specifiers else {
            return String::new();
        };

        let mut statements = Vec::new();
        let mut named = Vec::new();
        for specifier in specifiers {
            match specifier {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                    let local = default.local.name.as_str();
                    self.import_names.push(local.to_string());
                    statements.push(format!("const {} = {}.default;", local, var_name));
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                    let local = namespace.local.name.as_str();
                    self.import_names.push(local.to_string());
                    statements.push(format!("const {} = {};", local, var_name));
                }
                ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                    let local = spec.local.name.as_str();
                    self.import_names.push(local.to_string());
                    let imported = export_name(&spec.imported);
                    if imported == local {
                        named.push(local.to_string());
                    } else if is_identifier(&imported) {
                        named.push(format!("{}: {}", imported, local));
                    } else {
                        named.push(format!("{}: {}", quote(&imported), local));
                    }
                }
            }
        }
        if !named.is_empty() {
            statements.push(format!("const {{ {} }} = {};", named.join(", "), var_name));
        }
        statements.join(" ")
    }

    fn reexport_bindings(&mut self, decl: &ExportNamedDeclaration<'_>, var_name: &str) -> String {
        let mut statements = Vec::new();
        let mut named = Vec::new();
        for specifier in &decl.specifiers {
            let imported = export_name(&specifier.local);
            let exported = export_name(&specifier.exported);
            // `export { Button as default }` has no local name to bind.
            if !is_identifier(&exported) || exported == "default" {
                continue;
            }
            self.import_names.push(exported.clone());
            if imported == "default" {
                statements.push(format!("const {} = {}.default;", exported, var_name));
            } else if imported == exported {
                named.push(exported);
            } else if is_identifier(&imported) {
                named.push(format!("{}: {}", imported, exported));
            } else {
                named.push(format!("{}: {}", quote(&imported), exported));
            }
        }
        if !named.is_empty() {
            statements.insert(
                0,
                format!("const {{ {} }} = {};", named.join(", "), var_name),
            );
        }
        statements.join(" ")
    }
}

impl<'a> Visit<'a> for ImportCollector<'_> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        let specifier = decl.source.value.as_str();
        if let Some(entry) = self.resolve(specifier) {
            let replacement = self.bindings(decl, &entry.var_name);
            self.edits.push(Edit::replace(decl.span, replacement));
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            if let Some(entry) = self.resolve(source.value.as_str()) {
                let replacement = self.reexport_bindings(decl, &entry.var_name);
                self.edits.push(Edit::replace(decl.span, replacement));
            }
            return;
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if let Some(entry) = self.resolve(decl.source.value.as_str()) {
            let replacement = match decl.exported.as_ref().map(export_name) {
                Some(name) if is_identifier(&name) && name != "default" => {
                    self.import_names.push(name.clone());
                    format!("const {} = {};", name, entry.var_name)
                }
                _ => String::new(),
            };
            self.edits.push(Edit::replace(decl.span, replacement));
        }
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &call.callee {
            if ident.name.as_str() == "require" && call.arguments.len() == 1 {
                if let Argument::StringLiteral(lit) = &call.arguments[0] {
                    if let Some(entry) = self.resolve(lit.value.as_str()) {
                        self.edits
                            .push(Edit::replace(call.span, entry.var_name.clone()));
                        return;
                    }
                }
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &expr.source {
            if let Some(entry) = self.resolve(lit.value.as_str()) {
                self.edits.push(Edit::replace(
                    expr.span,
                    format!("Promise.resolve({})", entry.var_name),
                ));
                return;
            }
        }
        walk::walk_import_expression(self, expr);
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/') && !specifier.contains("://")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("'{}'", value))
}
