//! HTML pages: the example index and standalone editors.

use serde::Serialize;
use showroom_compiler::{CodeBlocksManifest, CompileSuccess};
use showroom_runtime::{FrameConfig, RenderOptions, decode_code_param, escape_attr, standalone_path};

/// Editor script served at [`EDITOR_SCRIPT_PATH`].
pub const EDITOR_SCRIPT: &str = include_str!("../assets/editor.js");

/// URL of the editor script, in the dev server and in built sites.
pub const EDITOR_SCRIPT_PATH: &str = "/__showroom/editor.js";

/// One-shot compile endpoint.
pub const COMPILE_PATH: &str = "/__showroom/compile";

/// Prefix of the editor session endpoints.
pub const SESSIONS_PATH: &str = "/__showroom/sessions";

/// Share endpoint the editor posts to.
pub const SHARE_PATH: &str = "/__showroom/share";

/// Body of the standalone route for an unknown hash.
pub const INVALID_EXAMPLE: &str = "Invalid example url.";

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #111827; }
header { padding: 12px 20px; border-bottom: 1px solid #e5e7eb; font-weight: 600; }
main { padding: 20px; max-width: 1100px; margin: 0 auto; }
h2 { font-size: 15px; margin: 28px 0 8px; color: #374151; }
.example { border: 1px solid #e5e7eb; border-radius: 6px; margin-bottom: 16px; overflow: hidden; }
.example pre { margin: 0; padding: 12px; background: #f9fafb; font-size: 13px; overflow: auto; }
.example a { display: block; padding: 6px 12px; font-size: 12px; border-top: 1px solid #e5e7eb; }
.showroom-frame { width: 100%; min-height: 120px; border: 0; display: block; }
.editor { display: grid; grid-template-columns: 1fr 1fr; height: calc(100vh - 46px); }
.editor textarea { font: 13px ui-monospace, monospace; padding: 12px; border: 0; border-right: 1px solid #e5e7eb; resize: none; }
.editor .preview { display: flex; flex-direction: column; }
.editor .preview .showroom-frame { flex: 1; }
#showroom-error { color: #b91c1c; white-space: pre-wrap; padding: 8px 12px; margin: 0; }
#showroom-error:empty, #showroom-console:empty { display: none; }
#showroom-console { font: 12px ui-monospace, monospace; padding: 8px 12px; margin: 0; border-top: 1px solid #e5e7eb; max-height: 30%; overflow: auto; }
header button { float: right; }
"#;

/// Settings embedded in a standalone page for the editor script.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditorSettings<'a> {
    hash: &'a str,
    original: &'a str,
    lang: showroom_compiler::SupportedLanguage,
    /// Endpoint of the dev server session; absent in built sites.
    session_url: Option<String>,
    share_url: &'a str,
}

/// Base URL of an editor session's endpoints.
pub fn session_path(id: &str) -> String {
    format!("{}/{}", SESSIONS_PATH, id)
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_attr(title),
        style = STYLE,
        body = body,
    )
}

/// Every precompiled example, grouped by document, with a live preview.
pub fn index_page(manifest: &CodeBlocksManifest, frame: &FrameConfig) -> String {
    let mut body = String::from("<header>Showroom</header>\n<main>\n");

    if manifest.items.is_empty() {
        body.push_str("<p>No examples found.</p>\n");
    }

    for document in &manifest.items {
        body.push_str(&format!("<h2>{}</h2>\n", escape_attr(&document.path)));
        for (source, block) in &document.blocks {
            let Some(success) = block else { continue };
            body.push_str("<section class=\"example\">\n");
            body.push_str(&frame.render_iframe(
                Some((success, RenderOptions::for_language(success.lang))),
                &document.path,
            ));
            body.push_str(&format!("\n<pre><code>{}</code></pre>\n", escape_attr(source)));
            if let Some(hash) = &success.initial_code_hash {
                body.push_str(&format!(
                    "<a href=\"{}\">Open in editor</a>\n",
                    escape_attr(&standalone_path(hash))
                ));
            }
            body.push_str("</section>\n");
        }
    }

    body.push_str("</main>");
    page("Showroom", &body)
}

/// Standalone editor for one example.
///
/// `code_param` is the page's `code` query parameter; an absent or
/// undecodable value opens the original example. Without a `session` the
/// editor only shows the precompiled example.
pub fn standalone_page(
    frame: &FrameConfig,
    source: &str,
    success: &CompileSuccess,
    code_param: Option<&str>,
    session: Option<&str>,
) -> String {
    let hash = success.initial_code_hash.as_deref().unwrap_or_default();
    let code = decode_code_param(code_param, source);

    let settings = EditorSettings {
        hash,
        original: source,
        lang: success.lang,
        session_url: session.map(session_path),
        share_url: SHARE_PATH,
    };
    let settings = serde_json::to_string(&settings)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/");

    // Edited code is compiled by the editor once it loads; until then the
    // frame shows the precompiled original.
    let body = format!(
        r#"<header>{lang} example <button id="showroom-share" type="button">Share</button></header>
<div class="editor">
<textarea id="showroom-source" spellcheck="false">{code}</textarea>
<div class="preview">
{iframe}
<pre id="showroom-error"></pre>
<pre id="showroom-console"></pre>
</div>
</div>
<script type="application/json" id="showroom-editor-config">{settings}</script>
<script src="{script}"></script>"#,
        lang = success.lang,
        code = escape_attr(&code),
        iframe = frame.render_iframe(
            Some((success, RenderOptions::for_language(success.lang))),
            "Preview"
        ),
        settings = settings,
        script = EDITOR_SCRIPT_PATH,
    );

    page("Showroom editor", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_compiler::{DocumentCodeBlocks, PRECOMPILED_MESSAGE_ID, SupportedLanguage};
    use showroom_runtime::encode_code_param;

    fn success(code: &str, hash: &str) -> CompileSuccess {
        CompileSuccess {
            code: code.to_string(),
            message_id: PRECOMPILED_MESSAGE_ID,
            import_names: vec![],
            imported_packages: vec![],
            lang: SupportedLanguage::Jsx,
            features: vec![],
            initial_code_hash: Some(hash.to_string()),
            unresolved_packages: vec![],
        }
    }

    fn manifest() -> CodeBlocksManifest {
        let mut blocks = showroom_compiler::CodeBlocks::new();
        blocks.insert(
            "<b>hi</b>".to_string(),
            Some(success("render(React.createElement(\"b\", null, \"hi\"));", "a1b2c3d4e5f6")),
        );
        CodeBlocksManifest {
            items: vec![DocumentCodeBlocks {
                path: "guide/intro.md".to_string(),
                blocks,
            }],
        }
    }

    #[test]
    fn index_links_every_example() {
        let html = index_page(&manifest(), &FrameConfig::builder().build());
        assert!(html.contains("guide/intro.md"));
        assert!(html.contains("href=\"/_standalone/a1b2c3d4e5f6/\""));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("sandbox=\"allow-scripts\""));
    }

    #[test]
    fn empty_index_says_so() {
        let html = index_page(&CodeBlocksManifest::default(), &FrameConfig::builder().build());
        assert!(html.contains("No examples found."));
    }

    #[test]
    fn standalone_page_prefills_shared_code() {
        let frame = FrameConfig::builder().build();
        let success = success("render(1);", "a1b2c3d4e5f6");
        let shared = encode_code_param("<i>edited</i>", "<b>hi</b>").unwrap();

        let html = standalone_page(&frame, "<b>hi</b>", &success, Some(&shared), Some("a1b2-1"));
        assert!(html.contains("&lt;i&gt;edited&lt;/i&gt;</textarea>"));
        assert!(html.contains("\"sessionUrl\":\"/__showroom/sessions/a1b2-1\""));
        assert!(html.contains(EDITOR_SCRIPT_PATH));
    }

    #[test]
    fn html_examples_skip_their_initial_console() {
        let frame = FrameConfig::builder().build();
        let mut html_success = success("renderHtml(\"<p>x</p>\");", "a1b2c3d4e5f6");
        html_success.lang = SupportedLanguage::Html;

        let html = standalone_page(&frame, "<p>x</p>", &html_success, None, None);
        assert!(html.contains("&quot;skipConsoleForInitialRender&quot;:true"));
        assert!(html.contains("\"sessionUrl\":null"));

        let jsx = standalone_page(&frame, "<b>hi</b>", &success("render(1);", "a1"), None, None);
        assert!(jsx.contains("&quot;skipConsoleForInitialRender&quot;:false"));
    }

    #[test]
    fn standalone_page_falls_back_on_garbage() {
        let frame = FrameConfig::builder().build();
        let success = success("render(1);", "a1b2c3d4e5f6");

        let html = standalone_page(&frame, "<b>hi</b>", &success, Some("%%%not-lz%%%"), None);
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;</textarea>"));
    }
}
