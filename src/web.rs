use crate::controller::{Controller, PopupController, ResultsView, UiEvent};
use crate::message::{CommandRouter, QuestionService, QuestionsReply, Request, ServiceHandle};
use crate::render::QuestionBlock;
use crate::{AssetSource, QuestionRecord, QuestionStore, SearchConfig, count_label};
use askama::Html as HtmlEscaper;
use askama::{MarkupDisplay, Template};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

type SharedState = Arc<AppState>;
const MAX_API_LIMIT: usize = 100;

pub struct AppState {
    pub service: ServiceHandle,
    pub search: SearchConfig,
    /// Relays `toggle-overlay` to the page registered as active.
    pub commands: Mutex<CommandRouter>,
}

impl AppState {
    pub fn new(service: ServiceHandle, search: SearchConfig) -> Self {
        Self {
            service,
            search,
            commands: Mutex::new(CommandRouter::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub source: AssetSource,
    pub search: SearchConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            source: AssetSource::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let service = QuestionService::new(config.source.clone()).spawn();
    let state = Arc::new(AppState::new(service, config.search.clone()));
    let router = build_router(state);
    info!(%config.addr, source = %config.source, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(popup_page))
        .route("/api/questions", get(api_questions))
        .route("/api/search", get(api_search))
        .route("/api/message", post(api_message))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "question-search-web" }))
}

#[derive(Debug, Deserialize)]
struct PageParams {
    q: Option<String>,
}

/// The popup, rendered server side: one fresh session per request.
async fn popup_page(
    State(state): State<SharedState>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let mut popup = PopupController::new(state.search.clone());
    if let Some(query) = params.q.filter(|q| !q.trim().is_empty()) {
        popup.handle(UiEvent::Input(query));
    }
    popup.handle(state.service.request_questions().await.into_event());
    let template = PopupTemplate::new(popup.view(), popup.session().input(), &state.search);
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(err.to_string())),
    )
}

async fn api_questions(State(state): State<SharedState>) -> Response {
    let reply = state.service.request_questions().await;
    let status = if reply.is_error() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(reply)).into_response()
}

/// The background-script entry point: one JSON message, one reply.
async fn api_message(State(state): State<SharedState>, Json(request): Json<Request>) -> Response {
    let reply = state.service.dispatch(request, &state.commands).await;
    let status = if reply.is_error() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(reply)).into_response()
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchResponsePayload {
    query: String,
    count: String,
    total: usize,
    matched: usize,
    limit: usize,
    results: Vec<QuestionRecord>,
}

async fn api_search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponsePayload>, ApiError> {
    let questions = match state.service.request_questions().await {
        QuestionsReply::Questions { questions } => questions,
        QuestionsReply::Error { error } => {
            warn!(%error, "search requested without questions");
            return Err(ApiError::unavailable(error));
        }
    };
    let query = params.q.unwrap_or_default().trim().to_string();
    let default_limit = if query.is_empty() {
        state.search.initial_limit
    } else {
        state.search.search_limit
    };
    let limit = params.limit.unwrap_or(default_limit).clamp(1, MAX_API_LIMIT);

    let mut store = QuestionStore::new(questions);
    store.apply(&query);
    Ok(Json(SearchResponsePayload {
        count: count_label(store.total(), store.matched(), &query),
        total: store.total(),
        matched: store.matched(),
        limit,
        results: store.visible(limit).cloned().collect(),
        query,
    }))
}

#[derive(Template)]
#[template(
    source = r#"{% macro marked(text) %}{% for segment in text.segments %}{% if segment.highlighted %}<mark class="highlight">{{ segment.text }}</mark>{% else %}{{ segment.text }}{% endif %}{% endfor %}{% endmacro %}<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Question Search</title>
    <style>
      body { font-family: sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
      main { max-width: 48rem; margin: 0 auto; padding: 1.5rem; }
      .question-item { background: #fff; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
      .question-type { color: #64748b; font-size: .85rem; }
      .correct-answers li { color: #166534; }
      mark.highlight { background: #fde047; padding: 0 1px; }
      .error-message { color: #b91c1c; }
      .shortcut-hint { color: #64748b; font-size: .85rem; }
    </style>
  </head>
  <body>
    <main>
      <form method="get" action="/" class="search-bar">
        <input type="text" id="search-input" name="q" value="{{ query }}" placeholder="Search questions..." autofocus />
        <button type="submit" id="search-button">Search</button>
        <a href="/" id="clear-button">Clear</a>
      </form>
      <p class="shortcut-hint">Press <kbd>{{ shortcut }}</kbd> to toggle the search overlay.</p>
      <p id="results-count">{{ count }}</p>
      {% if has_error %}
      <p class="error-message">{{ error }}</p>
      {% endif %}
      {% if no_results %}
      <p class="no-results">No questions found matching your search.</p>
      {% endif %}
      <div id="results-container">
        {% for block in blocks %}
        <div class="question-item">
          <div class="question-number">Question {% call marked(block.number) %} <span class="question-type">[{{ block.kind }}]</span></div>
          <div class="question-text">{% call marked(block.question) %}</div>
          {% if block.has_options() %}
          <div class="options">
            <strong>Options:</strong>
            <ul>
              {% for option in block.options %}
              <li>{% call marked(option) %}</li>
              {% endfor %}
            </ul>
          </div>
          {% endif %}
          {% if block.has_correct_answers() %}
          <div class="correct-answers">
            <strong>Correct Answer(s):</strong>
            <ul>
              {% for answer in block.correct_answers %}
              <li>{% call marked(answer) %}</li>
              {% endfor %}
            </ul>
          </div>
          {% endif %}
          {% match block.explanation %}
          {% when Some with (explanation) %}
          <div class="explanation"><strong>Explanation:</strong> {% call marked(explanation) %}</div>
          {% when None %}
          {% endmatch %}
        </div>
        {% endfor %}
      </div>
      <p><a href="{{ api_href|safe }}">View as JSON</a></p>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct PopupTemplate<'a> {
    query: &'a str,
    shortcut: String,
    count: &'a str,
    has_error: bool,
    error: &'a str,
    no_results: bool,
    blocks: &'a [QuestionBlock],
    api_href: String,
}

impl<'a> PopupTemplate<'a> {
    fn new(view: &'a ResultsView, query: &'a str, config: &SearchConfig) -> Self {
        let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC).to_string();
        Self {
            query,
            shortcut: config.toggle_shortcut.to_string(),
            count: &view.count,
            has_error: view.error.is_some(),
            error: view.error.as_deref().unwrap_or_default(),
            no_results: view.no_results,
            blocks: &view.list.blocks,
            api_href: format!("/api/search?q={encoded}"),
        }
    }
}

fn render_error_page(message: impl Into<String>) -> String {
    let message = MarkupDisplay::new_unsafe(message.into(), HtmlEscaper);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head><meta charset="utf-8" /><title>Question Search</title></head>
  <body><p class="error-message">{message}</p></body>
</html>"#
    )
}
