// src/server/mod.rs

//! Development file server with live reload.
//!
//! Serves the `dev` tree over `tiny_http`. HTML pages get the live-reload
//! client injected; the client long-polls [`POLL_PATH`] and is fed by a
//! [`ReloadHub`]. Each browser reloads on its own, nothing is mirrored
//! between clients.

pub mod reload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::paths::join_segments;

pub use reload::{PollResponse, ReloadEvent, ReloadHub};

pub const CLIENT_PATH: &str = "/__sitedag/client.js";
pub const POLL_PATH: &str = "/__sitedag/poll";

/// Threads answering long-poll requests.
pub const POLL_WORKERS: usize = 8;
/// Poll requests that may wait for a free worker. Beyond this a poll is
/// answered at once with whatever is already available.
pub const POLL_BACKLOG: usize = 8;

const POLL_TIMEOUT: Duration = Duration::from_secs(25);
const CLIENT_JS: &str = include_str!("client.js");

/// Status, content type and body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    fn json<T: serde::Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(200, "application/json", body),
            Err(err) => Self::text(500, &format!("failed to encode response: {err}")),
        }
    }
}

/// Request routing, independent of the socket.
#[derive(Debug, Clone)]
pub struct Router {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    hub: ReloadHub,
}

impl Router {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>, hub: ReloadHub) -> Self {
        Self {
            fs,
            root: root.into(),
            hub,
        }
    }

    pub fn is_poll(url: &str) -> bool {
        url_path(url) == POLL_PATH
    }

    /// Static files and the client script.
    pub fn route(&self, url: &str) -> Reply {
        let path = url_path(url);
        if path == CLIENT_PATH {
            return Reply::new(200, "application/javascript; charset=utf-8", CLIENT_JS);
        }

        let Some(decoded) = percent_decode(path) else {
            return Reply::text(400, "Bad Request");
        };

        let mut segments = Vec::new();
        for seg in decoded.split('/') {
            match seg {
                "" | "." => {}
                ".." => return Reply::text(403, "Forbidden"),
                s if s.contains('\\') => return Reply::text(403, "Forbidden"),
                s => segments.push(s),
            }
        }

        let mut file = join_segments(&self.root, segments);
        if self.fs.is_dir(&file) {
            file.push("index.html");
        }
        if !self.fs.is_file(&file) {
            return Reply::text(404, "Not Found");
        }

        match self.fs.read(&file) {
            Ok(bytes) => {
                let content_type = content_type_for(&file);
                if content_type.starts_with("text/html") {
                    Reply::new(200, content_type, inject_client(&bytes))
                } else {
                    Reply::new(200, content_type, bytes)
                }
            }
            Err(err) => {
                warn!(path = ?file, error = %err, "failed to read file for request");
                Reply::text(500, "Internal Server Error")
            }
        }
    }

    /// Long-poll for the next live-reload event after `?since=N`.
    ///
    /// Without `since` the current sequence number is returned at once, so a
    /// freshly loaded page only sees events published after it loaded.
    pub fn poll(&self, url: &str, timeout: Duration) -> Reply {
        let since = query_param(url, "since").and_then(|v| v.parse::<u64>().ok());
        let response = match since {
            None => PollResponse {
                seq: self.hub.sequence(),
                event: None,
            },
            Some(since) => self
                .hub
                .wait_after(since, timeout)
                .unwrap_or(PollResponse {
                    seq: since,
                    event: None,
                }),
        };
        Reply::json(&response)
    }
}

/// Bound development server.
pub struct DevServer {
    server: Server,
    router: Router,
}

impl std::fmt::Debug for DevServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl DevServer {
    pub fn bind(addr: &str, router: Router) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| anyhow!("binding dev server to {addr}: {e}"))?;
        Ok(Self { server, router })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until the process exits. Poll requests go to a fixed set of
    /// worker threads so a waiting client never blocks file requests.
    pub fn run(self) {
        info!(
            addr = ?self.local_addr(),
            root = ?self.router.root,
            "dev server listening"
        );

        let polls = spawn_poll_workers(&self.router);

        for request in self.server.incoming_requests() {
            if !matches!(request.method(), Method::Get | Method::Head) {
                respond(request, Reply::text(405, "Method Not Allowed"));
                continue;
            }

            let url = request.url().to_string();
            if Router::is_poll(&url) {
                if let Err(
                    TrySendError::Full((request, url)) | TrySendError::Disconnected((request, url)),
                ) = polls.try_send((request, url))
                {
                    debug!(%url, "poll workers busy, answering without waiting");
                    respond(request, self.router.poll(&url, Duration::ZERO));
                }
                continue;
            }

            let reply = self.router.route(&url);
            debug!(%url, status = reply.status, "served request");
            respond(request, reply);
        }
    }
}

type PollJob = (Request, String);

fn spawn_poll_workers(router: &Router) -> SyncSender<PollJob> {
    let (tx, rx) = mpsc::sync_channel::<PollJob>(POLL_BACKLOG);
    let rx = Arc::new(Mutex::new(rx));
    for _ in 0..POLL_WORKERS {
        let router = router.clone();
        let rx = Arc::clone(&rx);
        thread::spawn(move || poll_worker(&router, &rx));
    }
    tx
}

fn poll_worker(router: &Router, jobs: &Mutex<Receiver<PollJob>>) {
    loop {
        let job = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok((request, url)) = job else {
            return;
        };
        respond(request, router.poll(&url, POLL_TIMEOUT));
    }
}

fn respond(request: Request, reply: Reply) {
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    for (name, value) in [
        ("Content-Type", reply.content_type),
        ("Cache-Control", "no-cache"),
    ] {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response = response.with_header(header);
        }
    }
    if let Err(err) = request.respond(response) {
        debug!(error = %err, "client went away before the response was sent");
    }
}

fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then_some(v)
    })
}

/// Decode `%XX` escapes; `None` for malformed escapes or non-UTF-8 results.
pub fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Insert the client script before the last `</body>`, or append it.
pub fn inject_client(html: &[u8]) -> Vec<u8> {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    let text = String::from_utf8_lossy(html);
    let lower = text.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(text.len() + tag.len());
            out.push_str(&text[..pos]);
            out.push_str(&tag);
            out.push_str(&text[pos..]);
            out.into_bytes()
        }
        None => {
            let mut out = text.into_owned();
            out.push_str(&tag);
            out.into_bytes()
        }
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
