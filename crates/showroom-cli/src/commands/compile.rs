//! Compile command implementation.
//!
//! Compiles one snippet with the configured PackageMap and prints the
//! `CompileResult` exactly as the compile endpoint would return it.

use crate::cli::CompileArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::error::{CliError, Result, ResultExt};
use showroom_compiler::{CompileResult, Compiler, SupportedLanguage};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Execute the compile command.
pub async fn execute(args: CompileArgs, config_path: Option<&Path>) -> Result<()> {
    let root = utils::project_root(args.cwd.as_deref())?;
    let config = utils::load_config(&root, config_path, &ConfigOverrides::default())?;

    let lang = match args.lang {
        Some(lang) => lang.into(),
        None => infer_language(&args.file)?,
    };
    ensure_accepted(lang, &config.accepted_languages()?)?;
    let source = read_source(&args.file)?;

    let packages = Arc::new(config.package_map(&root)?);
    let compiler = Compiler::new(packages, config.compiler_options())?;
    let result = compiler.compile(&source, lang, 0);

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    match result {
        CompileResult::Success(_) => Ok(()),
        CompileResult::Error(failure) => Err(CliError::Custom(format!(
            "Snippet does not compile: {}",
            failure.error
        ))),
    }
}

/// Language from the file extension (`button.tsx` → tsx).
pub fn infer_language(file: &Path) -> Result<SupportedLanguage> {
    let ext = file
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "Cannot infer the language of {}; pass --lang",
                file.display()
            ))
        })?;
    Ok(ext.parse::<SupportedLanguage>()?)
}

/// Reject languages left out of the configured `languages`.
pub fn ensure_accepted(lang: SupportedLanguage, accepted: &[SupportedLanguage]) -> Result<()> {
    if accepted.contains(&lang) {
        return Ok(());
    }
    let enabled: Vec<&str> = accepted.iter().map(|enabled| enabled.as_str()).collect();
    Err(CliError::InvalidArgument(format!(
        "Language '{}' is not enabled for live compilation (enabled: {})",
        lang,
        enabled.join(", ")
    )))
}

fn read_source(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    std::fs::read_to_string(file).with_path(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_language_from_extension() {
        assert_eq!(
            infer_language(Path::new("demo/button.tsx")).unwrap(),
            SupportedLanguage::Tsx
        );
        assert_eq!(
            infer_language(Path::new("snippet.js")).unwrap(),
            SupportedLanguage::Js
        );
        assert_eq!(
            infer_language(Path::new("page.html")).unwrap(),
            SupportedLanguage::Html
        );
    }

    #[test]
    fn test_only_configured_languages_compile() {
        let accepted = [SupportedLanguage::Jsx, SupportedLanguage::Tsx];
        assert!(ensure_accepted(SupportedLanguage::Tsx, &accepted).is_ok());

        match ensure_accepted(SupportedLanguage::Html, &accepted) {
            Err(CliError::InvalidArgument(message)) => {
                assert!(message.contains("'html'"));
                assert!(message.contains("jsx, tsx"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_infer_language_rejects_unknown() {
        assert!(infer_language(Path::new("style.css")).is_err());
        assert!(matches!(
            infer_language(Path::new("-")),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
