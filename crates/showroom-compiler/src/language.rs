//! Supported snippet languages

use std::fmt;
use std::str::FromStr;

use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

use crate::error::ShowroomError;

/// Language tag of a snippet, as written on a code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Js,
    Jsx,
    Ts,
    Tsx,
    Html,
}

impl SupportedLanguage {
    pub const ALL: [SupportedLanguage; 5] = [
        SupportedLanguage::Js,
        SupportedLanguage::Jsx,
        SupportedLanguage::Ts,
        SupportedLanguage::Tsx,
        SupportedLanguage::Html,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SupportedLanguage::Js => "js",
            SupportedLanguage::Jsx => "jsx",
            SupportedLanguage::Ts => "ts",
            SupportedLanguage::Tsx => "tsx",
            SupportedLanguage::Html => "html",
        }
    }

    /// Non-visual snippets produce console output instead of a rendered view.
    pub fn is_non_visual(self) -> bool {
        matches!(self, SupportedLanguage::Js | SupportedLanguage::Ts)
    }

    /// Whether the snippet goes through the JS toolchain at all.
    pub fn is_script(self) -> bool {
        !matches!(self, SupportedLanguage::Html)
    }

    /// Parse the language out of a fence info string such as `tsx live`.
    ///
    /// Returns `None` for anything outside the supported set so callers can
    /// leave unrelated fences (`bash`, `json`, ...) alone.
    pub fn from_fence_info(info: &str) -> Option<Self> {
        info.split_whitespace().next().and_then(|tag| tag.parse().ok())
    }

    /// JSX is always enabled so `.js` examples may contain markup too.
    pub(crate) fn source_type(self) -> SourceType {
        match self {
            SupportedLanguage::Js | SupportedLanguage::Jsx | SupportedLanguage::Html => {
                SourceType::jsx()
            }
            SupportedLanguage::Ts | SupportedLanguage::Tsx => SourceType::tsx(),
        }
    }

    pub(crate) fn virtual_filename(self) -> &'static str {
        match self {
            SupportedLanguage::Js | SupportedLanguage::Jsx | SupportedLanguage::Html => {
                "snippet.jsx"
            }
            SupportedLanguage::Ts | SupportedLanguage::Tsx => "snippet.tsx",
        }
    }
}

impl FromStr for SupportedLanguage {
    type Err = ShowroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(SupportedLanguage::Js),
            "jsx" => Ok(SupportedLanguage::Jsx),
            "ts" | "typescript" => Ok(SupportedLanguage::Ts),
            "tsx" => Ok(SupportedLanguage::Tsx),
            "html" => Ok(SupportedLanguage::Html),
            _ => Err(ShowroomError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
