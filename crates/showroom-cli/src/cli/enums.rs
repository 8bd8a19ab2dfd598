//! Value enums for command-line arguments.

use clap::ValueEnum;
use showroom_compiler::SupportedLanguage;

/// Snippet language accepted by `--lang`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LangArg {
    /// JavaScript
    Js,
    /// JavaScript with JSX
    Jsx,
    /// TypeScript
    Ts,
    /// TypeScript with JSX
    Tsx,
    /// Plain HTML markup
    Html,
}

impl From<LangArg> for SupportedLanguage {
    fn from(lang: LangArg) -> Self {
        match lang {
            LangArg::Js => SupportedLanguage::Js,
            LangArg::Jsx => SupportedLanguage::Jsx,
            LangArg::Ts => SupportedLanguage::Ts,
            LangArg::Tsx => SupportedLanguage::Tsx,
            LangArg::Html => SupportedLanguage::Html,
        }
    }
}
