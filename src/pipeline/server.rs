//! Local document server.
//!
//! One server per conversion, bound to `127.0.0.1:0` so concurrent runs never
//! collide on a port. `GET /` renders the Markdown source on every request;
//! any other path is a static file under the server root (relative images,
//! fonts, stylesheets referenced by the document).

use crate::config::{ConversionConfig, Stylesheet};
use crate::error::Md2PdfError;
use crate::pipeline::document;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Time allowed for in-flight requests to finish before the serve task is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct ServerState {
    source: PathBuf,
    stylesheet: Option<Stylesheet>,
    root: PathBuf,
    render_error: Mutex<Option<Md2PdfError>>,
}

/// Entry point for starting a [`ServerHandle`].
pub struct DocumentServer;

impl DocumentServer {
    /// Bind an ephemeral localhost port and start serving `source`.
    pub async fn launch(source: &Path, config: &ConversionConfig) -> Result<ServerHandle, Md2PdfError> {
        let root = match &config.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().map_err(|e| {
                Md2PdfError::InvalidConfig(format!("cannot determine working directory: {e}"))
            })?,
        };
        let root = root.canonicalize().map_err(|e| {
            Md2PdfError::InvalidConfig(format!("static root '{}': {e}", root.display()))
        })?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|source| Md2PdfError::ServerBind { source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| Md2PdfError::ServerBind { source })?;

        let state = Arc::new(ServerState {
            source: source.to_path_buf(),
            stylesheet: config.stylesheet.clone(),
            root,
            render_error: Mutex::new(None),
        });

        let router = Router::new()
            .route("/", get(serve_document))
            .fallback(serve_static)
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!("Document server stopped with error: {}", e);
            }
        });

        debug!("Serving {} on http://{}", source.display(), addr);
        Ok(ServerHandle {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A running document server. Dropping it without calling
/// [`shutdown`](Self::shutdown) aborts the serve task.
pub struct ServerHandle {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL of the rendered document.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// The last error raised while rendering `/`, if any.
    pub fn take_render_error(&self) -> Option<Md2PdfError> {
        self.state
            .render_error
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
    }

    /// Stop accepting connections and wait for the serve task, bounded by a
    /// grace period.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
                Ok(_) => debug!("Document server on {} stopped", self.addr),
                Err(_) => {
                    warn!("Document server on {} did not stop in time, aborting", self.addr);
                    task.abort();
                }
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn serve_document(State(state): State<Arc<ServerState>>) -> Response {
    match document::render_file(&state.source, state.stylesheet.as_ref(), &state.root).await {
        Ok(doc) => Html(doc.html).into_response(),
        Err(e) => {
            warn!("Failed to render {}: {}", state.source.display(), e);
            let body = e.to_string();
            if let Ok(mut slot) = state.render_error.lock() {
                *slot = Some(e);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

async fn serve_static(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(path) = resolve_static(uri.path(), &state.root) else {
        debug!("404 {}", uri.path());
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            debug!("200 {} ({})", uri.path(), mime);
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        Err(e) => {
            debug!("404 {}: {}", uri.path(), e);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

/// Map a request path to a regular file under `root` (already canonical).
fn resolve_static(request_path: &str, root: &Path) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let relative = decoded.trim_start_matches('/');

    if relative.is_empty() || relative.split(['/', '\\']).any(|seg| seg == "..") {
        return None;
    }

    let canonical = root.join(relative).canonicalize().ok()?;
    if !canonical.starts_with(root) || !canonical.is_file() {
        return None;
    }
    Some(canonical)
}
