//! Sandboxed preview rendering
//!
//! The preview runs in an iframe with `sandbox="allow-scripts"` and no
//! same-origin access. [`FrameConfig::render_document`] produces the frame's
//! `srcdoc`; [`PreviewFrame`] is the host-side model of one frame: it decides
//! when the frame must re-run, tracks the error boundary and collects relayed
//! console output.

use std::sync::Arc;

use bon::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use showroom_compiler::{CompileSuccess, PackageMap, SupportedLanguage};
use tracing::debug;

/// Script executed inside every preview frame.
pub const FRAME_RUNTIME: &str = include_str!("../assets/frame-runtime.js");

/// `sandbox` attribute every preview iframe must carry.
pub const FRAME_SANDBOX: &str = "allow-scripts";

/// Options for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Do not relay console output until the first mount completed.
    pub skip_console_for_initial_render: bool,
}

impl RenderOptions {
    /// HTML snippets log their own mount, so the first batch is skipped.
    pub fn for_language(lang: SupportedLanguage) -> Self {
        Self {
            skip_console_for_initial_render: lang == SupportedLanguage::Html,
        }
    }
}

/// Message from the host to a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCommand {
    /// Always `"showroom-host"`.
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub lang: SupportedLanguage,
    pub skip_console_for_initial_render: bool,
}

impl RunCommand {
    pub fn new(code: impl Into<String>, lang: SupportedLanguage, options: RenderOptions) -> Self {
        Self {
            source: "showroom-host".to_string(),
            kind: "run".to_string(),
            code: code.into(),
            lang,
            skip_console_for_initial_render: options.skip_console_for_initial_render,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// Message from a frame to its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameMessage {
    Ready,
    Mounted,
    Console { level: ConsoleLevel, args: Vec<String> },
    RenderError { error: Value },
}

/// Display text for a thrown value: its `.message` if it has one, otherwise
/// the value itself.
pub fn format_thrown(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Static inputs of every frame document.
#[derive(Debug, Clone, Builder)]
pub struct FrameConfig {
    #[builder(default)]
    pub packages: Arc<PackageMap>,
    /// Browser import map: specifier → URL.
    #[builder(default)]
    pub import_map: IndexMap<String, String>,
    /// Classic scripts loaded before anything else (e.g. a UMD React build).
    #[builder(default)]
    pub frame_scripts: Vec<String>,
}

impl FrameConfig {
    /// Render the frame's complete HTML document, optionally running `initial`
    /// as soon as it loads.
    pub fn render_document(&self, initial: Option<(&CompileSuccess, RenderOptions)>) -> String {
        let mut head = String::new();
        if !self.import_map.is_empty() {
            let map = serde_json::json!({ "imports": self.import_map });
            head.push_str(&format!(
                "<script type=\"importmap\">{}</script>\n",
                escape_script(&map.to_string())
            ));
        }
        for src in &self.frame_scripts {
            head.push_str(&format!("<script src=\"{}\"></script>\n", escape_attr(src)));
        }

        let payload = initial
            .map(|(success, options)| RunCommand::new(&success.code, success.lang, options))
            .and_then(|command| serde_json::to_string(&command).ok())
            .unwrap_or_else(|| "null".to_string());

        let bootstrap = format!(
            "{}window.__showroomImports = imports;\n",
            self.packages.imports_attach()
        );

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{head}<style>
body {{ margin: 0; font-family: system-ui, sans-serif; }}
#showroom-root {{ padding: 8px; }}
.showroom-error {{ color: #b91c1c; white-space: pre-wrap; margin: 0; }}
</style>
</head>
<body>
<div id="showroom-root"></div>
<script type="application/json" id="showroom-payload">{payload}</script>
<script type="module">
{bootstrap}</script>
<script type="module">
{runtime}</script>
</body>
</html>
"#,
            head = head,
            payload = escape_script(&payload),
            bootstrap = escape_script(&bootstrap),
            runtime = FRAME_RUNTIME,
        )
    }

    /// An `<iframe>` element embedding the document through `srcdoc`.
    pub fn render_iframe(&self, initial: Option<(&CompileSuccess, RenderOptions)>, title: &str) -> String {
        format!(
            "<iframe class=\"showroom-frame\" title=\"{}\" sandbox=\"{}\" srcdoc=\"{}\"></iframe>",
            escape_attr(title),
            FRAME_SANDBOX,
            escape_attr(&self.render_document(initial))
        )
    }
}

/// State of a frame's error boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Nothing loaded yet.
    Idle,
    /// Code sent, no outcome yet.
    Running,
    Mounted,
    Errored { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Host-side model of one preview frame.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    code: Option<String>,
    lang: Option<SupportedLanguage>,
    boundary: Boundary,
    console: Vec<ConsoleEntry>,
    options: RenderOptions,
    mounted_once: bool,
}

impl Default for PreviewFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewFrame {
    pub fn new() -> Self {
        Self {
            code: None,
            lang: None,
            boundary: Boundary::Idle,
            console: Vec::new(),
            options: RenderOptions::default(),
            mounted_once: false,
        }
    }

    /// Load a compiled snippet. Returns the command to post to the frame, or
    /// `None` if the code is unchanged and the frame keeps its current state.
    ///
    /// Changed code always resets the boundary, so a failed example gets a
    /// fresh attempt after every edit.
    pub fn load(&mut self, success: &CompileSuccess) -> Option<RunCommand> {
        self.load_with(success, RenderOptions::for_language(success.lang))
    }

    pub fn load_with(&mut self, success: &CompileSuccess, options: RenderOptions) -> Option<RunCommand> {
        if self.code.as_deref() == Some(success.code.as_str()) {
            return None;
        }
        debug!(lang = %success.lang, "preview code changed, resetting boundary");
        self.code = Some(success.code.clone());
        self.lang = Some(success.lang);
        self.boundary = Boundary::Running;
        self.console.clear();
        self.options = options;
        Some(RunCommand::new(&success.code, success.lang, options))
    }

    /// Apply a message relayed by the frame.
    pub fn handle(&mut self, message: FrameMessage) {
        match message {
            FrameMessage::Ready => {}
            FrameMessage::Mounted => {
                self.mounted_once = true;
                if self.boundary == Boundary::Running {
                    self.boundary = Boundary::Mounted;
                }
            }
            FrameMessage::Console { level, args } => {
                if self.options.skip_console_for_initial_render && !self.mounted_once {
                    return;
                }
                self.console.push(ConsoleEntry {
                    level,
                    text: args.join(" "),
                });
            }
            FrameMessage::RenderError { error } => {
                self.mounted_once = true;
                self.boundary = Boundary::Errored {
                    message: format_thrown(&error),
                };
            }
        }
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn console(&self) -> &[ConsoleEntry] {
        &self.console
    }

    /// Whether the frame shows captured output instead of a rendered view.
    pub fn is_text_output(&self) -> bool {
        self.lang.is_some_and(SupportedLanguage::is_non_visual)
    }

    /// Captured console text, one entry per line.
    pub fn output(&self) -> String {
        self.console
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep JSON and scripts from closing the surrounding `<script>` element.
fn escape_script(text: &str) -> String {
    text.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Escape text for an HTML attribute value or element body.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use showroom_compiler::{ImportConfig, PRECOMPILED_MESSAGE_ID};
    use std::path::Path;

    fn compiled(code: &str, lang: SupportedLanguage) -> CompileSuccess {
        CompileSuccess {
            code: code.into(),
            message_id: PRECOMPILED_MESSAGE_ID,
            import_names: vec![],
            imported_packages: vec![],
            lang,
            features: vec![],
            initial_code_hash: None,
            unresolved_packages: vec![],
        }
    }

    #[test]
    fn thrown_values_prefer_message() {
        assert_eq!(format_thrown(&json!({"name": "TypeError", "message": "x is undefined"})), "x is undefined");
        assert_eq!(format_thrown(&json!("plain")), "plain");
        assert_eq!(format_thrown(&json!(42)), "42");
        assert_eq!(format_thrown(&json!({"code": 1})), "{\"code\":1}");
    }

    #[test]
    fn frame_messages_wire_shape() {
        let message: FrameMessage =
            serde_json::from_value(json!({"type": "console", "level": "warn", "args": ["a", "b"], "source": "showroom-frame"}))
                .unwrap();
        assert_eq!(
            message,
            FrameMessage::Console {
                level: ConsoleLevel::Warn,
                args: vec!["a".into(), "b".into()]
            }
        );
        let message: FrameMessage =
            serde_json::from_value(json!({"type": "renderError", "error": {"message": "boom"}})).unwrap();
        assert!(matches!(message, FrameMessage::RenderError { .. }));
    }

    #[test]
    fn boundary_resets_when_code_changes() {
        let mut frame = PreviewFrame::new();
        assert!(frame.load(&compiled("render(1)", SupportedLanguage::Jsx)).is_some());
        frame.handle(FrameMessage::RenderError {
            error: json!({"message": "broken"}),
        });
        assert_eq!(
            frame.boundary(),
            &Boundary::Errored {
                message: "broken".into()
            }
        );

        assert!(frame.load(&compiled("render(1)", SupportedLanguage::Jsx)).is_none());
        assert!(matches!(frame.boundary(), Boundary::Errored { .. }));

        let command = frame.load(&compiled("render(2)", SupportedLanguage::Jsx)).unwrap();
        assert_eq!(command.code, "render(2)");
        assert_eq!(frame.boundary(), &Boundary::Running);
        frame.handle(FrameMessage::Mounted);
        assert_eq!(frame.boundary(), &Boundary::Mounted);
    }

    #[test]
    fn initial_console_can_be_skipped() {
        let mut frame = PreviewFrame::new();
        frame.load(&compiled("renderHtml(\"<p>x</p>\")", SupportedLanguage::Html));
        frame.handle(FrameMessage::Console {
            level: ConsoleLevel::Log,
            args: vec!["mounting".into()],
        });
        assert!(frame.console().is_empty());

        frame.handle(FrameMessage::Mounted);
        frame.handle(FrameMessage::Console {
            level: ConsoleLevel::Log,
            args: vec!["clicked".into()],
        });
        assert_eq!(frame.output(), "clicked");
    }

    #[test]
    fn non_visual_snippets_capture_output() {
        let mut frame = PreviewFrame::new();
        frame.load(&compiled("console.log(1, 2)", SupportedLanguage::Ts));
        assert!(frame.is_text_output());
        frame.handle(FrameMessage::Console {
            level: ConsoleLevel::Log,
            args: vec!["1".into(), "2".into()],
        });
        frame.handle(FrameMessage::Console {
            level: ConsoleLevel::Info,
            args: vec!["done".into()],
        });
        assert_eq!(frame.output(), "1 2\ndone");
    }

    #[test]
    fn document_embeds_bootstrap_payload_and_runtime() {
        let packages =
            PackageMap::from_imports(&[ImportConfig::Package("acme-ui".into())], Path::new("/")).unwrap();
        let mut import_map = IndexMap::new();
        import_map.insert("acme-ui".to_string(), "https://cdn.example/acme-ui.js".to_string());
        let config = FrameConfig::builder()
            .packages(Arc::new(packages))
            .import_map(import_map)
            .frame_scripts(vec!["https://cdn.example/react.js".into()])
            .build();

        let success = compiled("render(\"</script>\")", SupportedLanguage::Jsx);
        let html = config.render_document(Some((&success, RenderOptions::default())));

        assert!(html.contains("<script type=\"importmap\">"));
        assert!(html.contains("https://cdn.example/acme-ui.js"));
        assert!(html.contains("<script src=\"https://cdn.example/react.js\"></script>"));
        assert!(html.contains("import * as _acmeUi from \"acme-ui\";"));
        assert!(html.contains("window.__showroomImports = imports;"));
        assert!(html.contains("showroom-frame"));
        assert!(!html.contains("render(\\\"</script>"));
        assert!(html.contains("<\\/script>"));

        let iframe = config.render_iframe(None, "Example");
        assert!(iframe.contains("sandbox=\"allow-scripts\""));
        assert!(!iframe.contains("allow-same-origin"));
    }
}
