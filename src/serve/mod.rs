//! Development server with live reload
//!
//! Serves the `dist` tree over HTTP. HTML pages are read from disk on each
//! request and get a small client script injected that listens on the
//! `/__livereload` websocket; every signal sent through the [`Reloader`]
//! makes connected pages call `location.reload()`.
//!
//! # Routes
//!
//! | Path | Response |
//! |------|----------|
//! | `/__livereload` | websocket, receives `reload` text messages |
//! | `*.html`, `/`, `dir/` | page with the reload script injected |
//! | anything else | static file below `dist` |

pub mod reload;

pub use reload::Reloader;

use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use warp::filters::path::Tail;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

/// Websocket path the injected script connects to.
pub const RELOAD_PATH: &str = "__livereload";

/// Text message sent to clients on reload.
pub const RELOAD_MESSAGE: &str = "reload";

const RELOAD_SCRIPT: &str = "<script>(function(){\
var p=location.protocol==='https:'?'wss://':'ws://';\
var s=new WebSocket(p+location.host+'/__livereload');\
s.onmessage=function(e){if(e.data==='reload'){location.reload();}};})();</script>";

/// Errors starting the dev server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Host and port do not form a usable address
    #[error("Invalid server address '{0}': {1}")]
    Address(String, String),
    /// Listening socket could not be bound
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, String),
}

/// Insert the live-reload script before the last `</body>`, or append it.
pub fn inject_reload_script(html: &str) -> String {
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}{}", html, RELOAD_SCRIPT),
    }
}

/// Map a request path to an HTML file below `root`.
///
/// Returns `None` for non-HTML paths, missing files, and paths that could
/// escape `root`.
fn resolve_html_path(root: &Path, tail: &str) -> Option<PathBuf> {
    if tail.contains('%') || tail.contains('\\') {
        return None;
    }
    let relative = Path::new(tail);
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }

    let candidate = root.join(relative);
    let page = if tail.is_empty() || tail.ends_with('/') || candidate.is_dir() {
        candidate.join("index.html")
    } else if tail.ends_with(".html") {
        candidate
    } else {
        return None;
    };

    page.is_file().then_some(page)
}

async fn serve_html(root: PathBuf, tail: Tail) -> Result<warp::reply::Html<String>, Rejection> {
    let page = resolve_html_path(&root, tail.as_str()).ok_or_else(warp::reject::not_found)?;
    match tokio::fs::read_to_string(&page).await {
        Ok(html) => Ok(warp::reply::html(inject_reload_script(&html))),
        Err(e) => {
            tracing::warn!("could not read {}: {}", page.display(), e);
            Err(warp::reject::not_found())
        }
    }
}

async fn client_loop(socket: WebSocket, reloader: Reloader) {
    let (mut outgoing, mut incoming) = socket.split();
    let mut signals = reloader.subscribe();
    tracing::debug!("live-reload client connected ({} total)", reloader.client_count());

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if outgoing.send(Message::text(RELOAD_MESSAGE)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(msg)) if !msg.is_close() => {}
                _ => break,
            },
        }
    }

    tracing::debug!("live-reload client disconnected");
}

fn routes(
    root: PathBuf,
    reloader: Reloader,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let livereload = warp::path(RELOAD_PATH).and(warp::path::end()).and(warp::ws()).map(
        move |ws: Ws| {
            let reloader = reloader.clone();
            ws.on_upgrade(move |socket| client_loop(socket, reloader))
        },
    );

    let html_root = root.clone();
    let pages = warp::get()
        .and(warp::path::tail())
        .and_then(move |tail: Tail| serve_html(html_root.clone(), tail));

    livereload.or(pages).or(warp::fs::dir(root))
}

/// HTTP server for the `dist` tree.
#[derive(Debug, Clone)]
pub struct DevServer {
    root: PathBuf,
    addr: SocketAddr,
    reloader: Reloader,
}

impl DevServer {
    /// Create a server for `root` listening on `host:port`.
    pub fn new(
        root: impl Into<PathBuf>,
        host: &str,
        port: u16,
        reloader: Reloader,
    ) -> Result<Self, ServeError> {
        let display = format!("{}:{}", host, port);
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| ServeError::Address(display.clone(), e.to_string()))?
            .next()
            .ok_or_else(|| ServeError::Address(display, "no address found".to_string()))?;

        Ok(Self { root: root.into(), addr, reloader })
    }

    /// Bind the listening socket.
    ///
    /// Returns the bound address (with the real port when port 0 was
    /// requested) and the future that serves requests. Must be called from
    /// within a Tokio runtime.
    pub fn bind(self) -> Result<(SocketAddr, impl Future<Output = ()>), ServeError> {
        let addr = self.addr;
        warp::serve(routes(self.root, self.reloader))
            .try_bind_ephemeral(addr)
            .map_err(|e| ServeError::Bind(addr, e.to_string()))
    }
}
