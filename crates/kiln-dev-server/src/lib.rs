use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub mod livereload;
pub mod watcher;

pub use livereload::{LiveReload, LiveReloadMessage};
pub use watcher::FileWatcher;

/// WebSocket endpoint for live reload clients
pub const LIVE_RELOAD_PATH: &str = "/__kiln/livereload";

/// Client script injected into served HTML pages
pub const LIVE_RELOAD_SCRIPT_PATH: &str = "/__kiln/livereload.js";

/// Static file server with live reload
pub struct DevServer {
    config: ServerConfig,
    live_reload: Arc<LiveReload>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to; 0 picks a free port
    pub port: u16,

    /// Directory served at `/`
    pub root_dir: PathBuf,

    /// Show connection and error notices in the browser console
    pub notify: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root_dir: PathBuf::from("."),
            notify: false,
        }
    }
}

/// A server accepting connections in the background
pub struct RunningServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl RunningServer {
    pub fn into_handle(self) -> JoinHandle<()> {
        self.handle
    }
}

/// Server state shared across handlers
#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    live_reload: Arc<LiveReload>,
    notify: bool,
}

impl DevServer {
    pub fn new(config: ServerConfig, live_reload: Arc<LiveReload>) -> Self {
        Self {
            config,
            live_reload,
        }
    }

    /// Bind the listener and serve from a background task
    pub async fn bind(self) -> Result<RunningServer> {
        let addr = format!("{}:{}", self.config.host, self.config.port)
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid server address {}:{}", self.config.host, self.config.port))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let addr = listener.local_addr()?;

        let app = self.router();
        tracing::info!(
            "Serving {} on http://{}",
            self.config.root_dir.display(),
            addr
        );

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Dev server stopped: {}", e);
            }
        });

        Ok(RunningServer { addr, handle })
    }

    /// Create Axum router
    pub fn router(&self) -> Router {
        let state = ServerState {
            root: Arc::new(self.config.root_dir.clone()),
            live_reload: self.live_reload.clone(),
            notify: self.config.notify,
        };

        Router::new()
            .route(LIVE_RELOAD_PATH, get(live_reload_handler))
            .route(LIVE_RELOAD_SCRIPT_PATH, get(client_script_handler))
            .fallback(serve_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

/// WebSocket handler for live reload
async fn live_reload_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(|socket| live_reload_socket(socket, state))
}

/// Handle one live reload connection
async fn live_reload_socket(socket: WebSocket, state: ServerState) {
    tracing::debug!("Live reload client connected");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before greeting so nothing sent in between is missed
    let mut rx = state.live_reload.subscribe();

    let send_task = tokio::spawn(async move {
        let mut next = Some(LiveReloadMessage::Connected);
        loop {
            let message = match next.take() {
                Some(message) => message,
                None => match rx.recv().await {
                    Ok(message) => message,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Live reload client lagged by {} message(s)", skipped);
                        LiveReloadMessage::FullReload {
                            reason: "missed updates".to_string(),
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            };

            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode live reload message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    tracing::debug!("Live reload client disconnected");
}

async fn client_script_handler(State(state): State<ServerState>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        client_script(state.notify),
    )
        .into_response()
}

/// Serve files from the root directory
async fn serve_handler(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(relative) = request_path(uri.path()) else {
        tracing::debug!("Rejected path: {}", uri.path());
        return not_found();
    };

    let mut file_path = state.root.join(&relative);
    if file_path.is_dir() {
        file_path = file_path.join("index.html");
    }

    let content = match tokio::fs::read(&file_path).await {
        Ok(content) => content,
        Err(_) => return not_found(),
    };

    let content_type = guess_content_type(&file_path);
    let body = if content_type.starts_with("text/html") {
        Body::from(inject_client(&String::from_utf8_lossy(&content)))
    } else {
        Body::from(content)
    };

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Decode a request path into a path relative to the root
///
/// Returns `None` for anything that would leave the root.
fn request_path(uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Insert the client script before `</body>`, or append it
fn inject_client(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", LIVE_RELOAD_SCRIPT_PATH);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => format!("{}{}\n{}", &html[..pos], tag, &html[pos..]),
        None => format!("{}\n{}", html, tag),
    }
}

/// Guess content type from file extension
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Browser side of live reload
fn client_script(notify: bool) -> String {
    format!(
        r#"// kiln live reload client
(function() {{
  if (typeof window === 'undefined' || window.__kilnLiveReload) return;
  window.__kilnLiveReload = true;

  var NOTIFY = {notify};
  var protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
  var ws = new WebSocket(protocol + '//' + window.location.host + '{path}');

  function refreshStylesheets(paths) {{
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var stamp = Date.now();
    Array.prototype.forEach.call(links, function(link) {{
      var url = new URL(link.href, window.location.href);
      var matches = paths.some(function(p) {{
        return url.pathname.replace(/^\//, '') === p.replace(/^\//, '');
      }});
      if (!matches) return;
      url.searchParams.set('kiln', stamp);
      link.href = url.toString();
    }});
  }}

  ws.onmessage = function(event) {{
    var message = JSON.parse(event.data);
    switch (message.type) {{
      case 'connected':
        if (NOTIFY) console.log('[kiln] Live reload connected');
        break;
      case 'css-update':
        refreshStylesheets(message.paths);
        break;
      case 'full-reload':
        window.location.reload();
        break;
      case 'error':
        if (NOTIFY) console.error('[kiln] ' + message.title + ': ' + message.message);
        break;
    }}
  }};

  ws.onclose = function() {{
    if (NOTIFY) console.log('[kiln] Live reload disconnected. Retrying in 1s...');
    setTimeout(function() {{ window.location.reload(); }}, 1000);
  }};
}})();
"#,
        notify = notify,
        path = LIVE_RELOAD_PATH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/"), Some(PathBuf::new()));
        assert_eq!(
            request_path("/assets/css/main.css"),
            Some(PathBuf::from("assets/css/main.css"))
        );
        assert_eq!(
            request_path("/my%20page.html"),
            Some(PathBuf::from("my page.html"))
        );
        assert_eq!(request_path("/../secret"), None);
        assert_eq!(request_path("/a/%2e%2e/%2e%2e/secret"), None);
    }

    #[test]
    fn test_inject_client() {
        let html = "<html><body><p>hi</p></BODY></html>";
        let injected = inject_client(html);
        assert_eq!(
            injected,
            "<html><body><p>hi</p><script src=\"/__kiln/livereload.js\"></script>\n</BODY></html>"
        );

        let fragment = inject_client("<p>no body</p>");
        assert!(fragment.ends_with("<script src=\"/__kiln/livereload.js\"></script>"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("app.js.map")), "application/json; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_client_script_notify_flag() {
        assert!(client_script(true).contains("var NOTIFY = true;"));
        assert!(client_script(false).contains("var NOTIFY = false;"));
        assert!(client_script(false).contains("/__kiln/livereload'"));
    }
}
