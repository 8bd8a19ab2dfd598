//! Development server: editor sessions, example pages and SSE.

use crate::dev::{DevEvent, SharedState};
use crate::error::{CliError, Result};
use crate::site;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response, Sse, sse::Event, sse::KeepAlive},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use showroom_compiler::{CompileFailure, CompileRequest, CompileResult};
use showroom_runtime::{BackendState, CODE_PARAM, COMPILATION_ERROR_MESSAGE, FrameMessage, share_url};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

/// Development server.
pub struct DevServer {
    addr: SocketAddr,
    state: SharedState,
}

impl DevServer {
    pub fn new(addr: SocketAddr, state: SharedState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until the task is dropped.
    pub async fn start(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", self.addr, e)))?;

        crate::ui::success(&format!("Showroom running at http://{}", self.addr));

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Event client injected into every page the dev server renders.
const RELOAD_SCRIPT: &str = include_str!("../../assets/reload.js");

const RELOAD_SCRIPT_PATH: &str = "/__showroom/reload.js";

/// All dev server routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/_standalone/{hash}", get(handle_standalone))
        .route("/_standalone/{hash}/", get(handle_standalone))
        .route(site::COMPILE_PATH, post(handle_compile))
        .route("/__showroom/sessions/{id}/edit", post(handle_session_edit))
        .route("/__showroom/sessions/{id}/frame", post(handle_session_frame))
        .route("/__showroom/codeblocks.json", get(handle_codeblocks))
        .route("/__showroom/share", post(handle_share))
        .route("/__showroom/status", get(handle_status))
        .route("/__showroom/events", get(handle_sse))
        .route(site::EDITOR_SCRIPT_PATH, get(handle_editor_script))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Compile one snippet outside any session; the request's message id is
/// echoed. Only build-time seeds are shared between requests.
async fn handle_compile(
    State(state): State<SharedState>,
    Json(request): Json<CompileRequest>,
) -> Response {
    if !state.accepts(request.lang) {
        return language_not_enabled(&request);
    }
    match state.fresh_store().fetch(&request.source, request.lang).await {
        Ok(result) => Json(result.with_message_id(request.message_id)).into_response(),
        Err(err) => {
            warn!(error = %err, "compile worker unavailable");
            let failure = CompileResult::Error(CompileFailure {
                error: COMPILATION_ERROR_MESSAGE.to_string(),
                message_id: request.message_id,
                meta: None,
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(failure)).into_response()
        }
    }
}

/// Apply an edit to a session; 204 when a newer edit superseded it.
async fn handle_session_edit(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<CompileRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&id) else {
        return unknown_session(&id);
    };
    if !state.accepts(request.lang) {
        return language_not_enabled(&request);
    }
    debug!(session = %id, example = %session.hash(), message_id = request.message_id, "editor edit");
    match session.edit(request).await {
        Some(outcome) => Json(outcome).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Relay a preview frame message to its session and answer with the view.
async fn handle_session_frame(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(message): Json<FrameMessage>,
) -> Response {
    match state.sessions.get(&id) {
        Some(session) => Json(session.frame_message(message)).into_response(),
        None => unknown_session(&id),
    }
}

fn unknown_session(id: &str) -> Response {
    debug!(session = %id, "unknown editor session");
    (StatusCode::NOT_FOUND, "Unknown editor session.").into_response()
}

fn language_not_enabled(request: &CompileRequest) -> Response {
    let failure = CompileResult::Error(CompileFailure {
        error: format!("Language '{}' is not enabled for live compilation", request.lang),
        message_id: request.message_id,
        meta: None,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(failure)).into_response()
}

async fn handle_codeblocks(State(state): State<SharedState>) -> Response {
    Json(&*state.manifest()).into_response()
}

/// Build and worker status, for tooling and the index page.
async fn handle_status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let status = state.get_status();
    let backend = match state.channel().backend_state() {
        BackendState::Uninitialized => "uninitialized".to_string(),
        BackendState::Initializing => "initializing".to_string(),
        BackendState::Ready => "ready".to_string(),
        BackendState::Failed { reason } => format!("failed: {}", reason),
    };
    Json(serde_json::json!({
        "build": status.label(),
        "error": status.error(),
        "blocks": state.manifest().block_count(),
        "backend": backend,
        "clients": state.client_count(),
    }))
}

#[derive(Debug, Deserialize)]
struct ShareRequest {
    hash: String,
    code: String,
}

#[derive(Debug, Serialize)]
struct ShareResponse {
    url: String,
}

/// Turn edited code into a shareable standalone-editor URL.
async fn handle_share(
    State(state): State<SharedState>,
    Json(request): Json<ShareRequest>,
) -> Response {
    let manifest = state.manifest();
    match manifest.find_by_hash(&request.hash) {
        Some((original, _)) => Json(ShareResponse {
            url: share_url(&request.hash, &request.code, original),
        })
        .into_response(),
        None => invalid_example(),
    }
}

async fn handle_index(State(state): State<SharedState>) -> Html<String> {
    Html(inject_reload_script(site::index_page(
        &state.manifest(),
        &state.frame,
    )))
}

async fn handle_standalone(
    State(state): State<SharedState>,
    Path(hash): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let manifest = state.manifest();
    let Some((source, success)) = manifest.find_by_hash(&hash) else {
        debug!(%hash, "unknown standalone example");
        return invalid_example();
    };

    let session = state.open_session(&hash, source, success);
    debug!(%session, "opened editor session");
    Html(inject_reload_script(site::standalone_page(
        &state.frame,
        source,
        success,
        params.get(CODE_PARAM).map(String::as_str),
        Some(&session),
    )))
    .into_response()
}

fn invalid_example() -> Response {
    (StatusCode::NOT_FOUND, site::INVALID_EXAMPLE).into_response()
}

async fn handle_editor_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        site::EDITOR_SCRIPT,
    )
        .into_response()
}

async fn handle_reload_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
        .into_response()
}

/// Add the event client before `</body>`, or at the end without one.
fn inject_reload_script(mut html: String) -> String {
    let tag = format!("<script src=\"{}\"></script>\n", RELOAD_SCRIPT_PATH);
    match html.rfind("</body>") {
        Some(pos) => html.insert_str(pos, &tag),
        None => html.push_str(&tag),
    }
    html
}

/// Stream dev events to a browser.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    debug!(id, "SSE client connected");
    state.broadcast(&DevEvent::ClientConnected { id }).await;

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::DevServerState;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use showroom_compiler::{
        CodeBlocks, CodeBlocksManifest, Compiler, CompilerOptions, DocumentCodeBlocks, PackageMap,
        SupportedLanguage,
    };
    use showroom_runtime::{BackendHandle, CompileChannel, FrameConfig, encode_code_param};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SOURCE: &str = "<b>hi</b>";

    fn state() -> (BackendHandle, SharedState) {
        state_with(SupportedLanguage::ALL.to_vec())
    }

    fn state_with(languages: Vec<SupportedLanguage>) -> (BackendHandle, SharedState) {
        let packages = Arc::new(PackageMap::new());
        let (backend, endpoint) =
            BackendHandle::with_compiler(packages.clone(), CompilerOptions::default()).unwrap();
        let state = DevServerState::new(
            CompileChannel::connect(endpoint),
            FrameConfig::builder().packages(packages.clone()).build(),
            Duration::from_millis(10),
        )
        .with_languages(languages);

        let compiler = Compiler::new(packages, CompilerOptions::default()).unwrap();
        let mut blocks = CodeBlocks::new();
        blocks.insert(
            SOURCE.to_string(),
            Some(compiler.precompile(SOURCE, SupportedLanguage::Jsx).unwrap()),
        );
        state.complete_build(
            CodeBlocksManifest {
                items: vec![DocumentCodeBlocks {
                    path: "intro.md".to_string(),
                    blocks,
                }],
            },
            1,
        );
        (backend, Arc::new(state))
    }

    fn hash(state: &SharedState) -> String {
        state.manifest().items[0].blocks[SOURCE]
            .as_ref()
            .and_then(|success| success.initial_code_hash.clone())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn compile_echoes_message_id() {
        let (_backend, state) = state();
        let response = router(state)
            .oneshot(post_json(
                "/__showroom/compile",
                serde_json::json!({ "source": "<i>x</i>", "lang": "jsx", "messageId": 7 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: CompileResult = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(result.message_id(), 7);
        assert!(result.as_success().unwrap().code.contains("render("));
    }

    #[tokio::test]
    async fn compile_reports_errors_as_data() {
        let (_backend, state) = state();
        let response = router(state)
            .oneshot(post_json(
                "/__showroom/compile",
                serde_json::json!({ "source": "const a = 1;\nconst b = 'x;", "lang": "js", "messageId": 3 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let result: CompileResult = serde_json::from_str(&body_text(response).await).unwrap();
        match result {
            CompileResult::Error(failure) => {
                assert_eq!(failure.message_id, 3);
                assert_eq!(failure.line(), Some(2));
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn compile_rejects_languages_not_enabled() {
        let (_backend, state) = state_with(vec![SupportedLanguage::Jsx]);
        let response = router(state)
            .oneshot(post_json(
                "/__showroom/compile",
                serde_json::json!({ "source": "<p>x</p>", "lang": "html", "messageId": 2 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let result: CompileResult = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(result.message_id(), 2);
        assert!(result.as_success().is_none());
    }

    #[tokio::test]
    async fn standalone_editor_drives_its_session() {
        let (_backend, state) = state();
        let hash = hash(&state);
        let app = router(state.clone());

        let page = app
            .clone()
            .oneshot(
                Request::get(format!("/_standalone/{}/", hash))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let page = body_text(page).await;
        let session = format!("/__showroom/sessions/{}-1", hash);
        assert!(page.contains(&format!("\"sessionUrl\":\"{}\"", session)));
        assert!(page.contains("<script src=\"/__showroom/reload.js\"></script>\n</body>"));
        assert_eq!(state.sessions.len(), 1);

        let edited = app
            .clone()
            .oneshot(post_json(
                &format!("{}/edit", session),
                serde_json::json!({ "source": "<i>x</i>", "lang": "jsx", "messageId": 5 }),
            ))
            .await
            .unwrap();
        assert_eq!(edited.status(), StatusCode::OK);
        let outcome: serde_json::Value = serde_json::from_str(&body_text(edited).await).unwrap();
        assert_eq!(outcome["result"]["messageId"], 5);
        assert_eq!(outcome["result"]["type"], "success");
        assert_eq!(outcome["run"]["type"], "run");
        assert_eq!(outcome["run"]["skipConsoleForInitialRender"], false);

        let view = app
            .oneshot(post_json(
                &format!("{}/frame", session),
                serde_json::json!({ "source": "showroom-frame", "type": "mounted" }),
            ))
            .await
            .unwrap();
        let view: serde_json::Value = serde_json::from_str(&body_text(view).await).unwrap();
        assert_eq!(view["status"], "mounted");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (_backend, state) = state();
        let response = router(state)
            .oneshot(post_json(
                "/__showroom/sessions/nope-1/edit",
                serde_json::json!({ "source": "1", "lang": "js", "messageId": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn reload_script_goes_before_body_end() {
        let html = inject_reload_script("<html><body><h1>x</h1></body></html>".to_string());
        let script = html.find(RELOAD_SCRIPT_PATH).unwrap();
        assert!(script < html.find("</body>").unwrap());

        let bare = inject_reload_script("<h1>x</h1>".to_string());
        assert!(bare.ends_with("</script>\n"));
    }

    #[tokio::test]
    async fn standalone_editor_for_known_hash() {
        let (_backend, state) = state();
        let hash = hash(&state);
        let edited = encode_code_param("<i>edited</i>", SOURCE).unwrap();

        let response = router(state)
            .oneshot(
                Request::get(format!("/_standalone/{}/?code={}", hash, edited))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("&lt;i&gt;edited&lt;/i&gt;</textarea>"));
    }

    #[tokio::test]
    async fn unknown_hash_is_invalid_example() {
        let (_backend, state) = state();
        let response = router(state)
            .oneshot(
                Request::get("/_standalone/000000000000/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Invalid example url.");
    }

    #[tokio::test]
    async fn share_builds_url_only_for_edits() {
        let (_backend, state) = state();
        let hash = hash(&state);
        let app = router(state);

        let unchanged = app
            .clone()
            .oneshot(post_json(
                "/__showroom/share",
                serde_json::json!({ "hash": hash, "code": SOURCE }),
            ))
            .await
            .unwrap();
        let body: serde_json::Value =
            serde_json::from_str(&body_text(unchanged).await).unwrap();
        assert_eq!(body["url"], format!("/_standalone/{}/", hash));

        let edited = app
            .oneshot(post_json(
                "/__showroom/share",
                serde_json::json!({ "hash": hash, "code": "<i>new</i>" }),
            ))
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_text(edited).await).unwrap();
        assert!(body["url"].as_str().unwrap().contains("?code="));
    }

    #[tokio::test]
    async fn status_reports_build_and_clients() {
        let (_backend, state) = state();
        let response = router(state)
            .oneshot(
                Request::get("/__showroom/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["build"], "ready");
        assert_eq!(body["blocks"], 1);
        assert_eq!(body["clients"], 0);
    }

    #[tokio::test]
    async fn codeblocks_and_index() {
        let (_backend, state) = state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::get("/__showroom/codeblocks.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let manifest: CodeBlocksManifest =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(manifest.block_count(), 1);

        let index = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let index = body_text(index).await;
        assert!(index.contains("intro.md"));
        assert!(index.contains(RELOAD_SCRIPT_PATH));
    }
}
