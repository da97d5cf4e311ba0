// tests/dev_server.rs

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sitedag::fs::mock::MockFileSystem;
use sitedag::server::{
    CLIENT_PATH, DevServer, POLL_PATH, ReloadEvent, ReloadHub, Router, content_type_for,
    inject_client, percent_decode,
};

const PAGE: &str = "<!DOCTYPE html><html><head><title>x</title></head><body><p>hi</p></body></html>";

fn router() -> (Router, ReloadHub) {
    let fs = MockFileSystem::new();
    fs.add_file("dev/index.html", PAGE);
    fs.add_file("dev/about/index.html", "<p>about</p>");
    fs.add_file("dev/assets/css/main.css", ".a{color:red}");
    fs.add_file("dev/a b.txt", "spaced");
    fs.add_file("secret.txt", "outside");
    let hub = ReloadHub::new();
    (Router::new(Arc::new(fs), "dev", hub.clone()), hub)
}

fn body(reply: &sitedag::server::Reply) -> String {
    String::from_utf8(reply.body.clone()).unwrap()
}

#[test]
fn serves_index_pages_with_the_client_injected() {
    let (router, _) = router();

    let root = router.route("/");
    assert_eq!(root.status, 200);
    assert_eq!(root.content_type, "text/html; charset=utf-8");
    assert!(body(&root).ends_with(&format!(
        "<p>hi</p><script src=\"{CLIENT_PATH}\"></script></body></html>"
    )));

    let about = router.route("/about/?utm=1");
    assert_eq!(about.status, 200);
    assert_eq!(
        body(&about),
        format!("<p>about</p><script src=\"{CLIENT_PATH}\"></script>")
    );
}

#[test]
fn serves_assets_untouched() {
    let (router, _) = router();
    let css = router.route("/assets/css/main.css");
    assert_eq!(css.status, 200);
    assert_eq!(css.content_type, "text/css; charset=utf-8");
    assert_eq!(body(&css), ".a{color:red}");

    assert_eq!(body(&router.route("/a%20b.txt")), "spaced");
}

#[test]
fn rejects_missing_malformed_and_escaping_paths() {
    let (router, _) = router();
    assert_eq!(router.route("/nope.html").status, 404);
    assert_eq!(router.route("/bad%zz").status, 400);
    assert_eq!(router.route("/../secret.txt").status, 403);
    assert_eq!(router.route("/%2e%2e/secret.txt").status, 403);
    assert_eq!(router.route("/assets/..%5csecret.txt").status, 403);
}

#[test]
fn serves_the_client_script() {
    let (router, _) = router();
    let client = router.route(CLIENT_PATH);
    assert_eq!(client.status, 200);
    assert!(client.content_type.starts_with("application/javascript"));
    assert!(body(&client).contains(POLL_PATH));
}

#[test]
fn poll_without_since_returns_the_current_sequence() {
    let (router, hub) = router();
    hub.notify(ReloadEvent::Reload);
    assert!(Router::is_poll(&format!("{POLL_PATH}?x=1")));
    let reply = router.poll(POLL_PATH, Duration::from_secs(5));
    assert_eq!(reply.content_type, "application/json");
    assert_eq!(body(&reply), r#"{"seq":1,"event":null}"#);
}

#[test]
fn poll_returns_pending_events_as_json() {
    let (router, hub) = router();
    hub.notify(ReloadEvent::InjectCss {
        paths: vec!["/assets/css/main.css".into()],
    });
    let reply = router.poll(&format!("{POLL_PATH}?since=0"), Duration::from_secs(5));
    assert_eq!(
        body(&reply),
        r#"{"seq":1,"event":{"kind":"inject_css","paths":["/assets/css/main.css"]}}"#
    );

    let idle = router.poll(&format!("{POLL_PATH}?since=1"), Duration::from_millis(10));
    assert_eq!(body(&idle), r#"{"seq":1,"event":null}"#);
}

#[test]
fn hub_coalesces_pending_events() {
    let hub = ReloadHub::new();
    let css = |p: &str| ReloadEvent::InjectCss {
        paths: vec![p.to_string()],
    };
    hub.notify(css("/a.css"));
    hub.notify(css("/b.css"));
    hub.notify(css("/a.css"));

    let polled = hub.wait_after(0, Duration::from_millis(10)).unwrap();
    assert_eq!(polled.seq, 3);
    assert_eq!(
        polled.event,
        Some(ReloadEvent::InjectCss {
            paths: vec!["/a.css".into(), "/b.css".into()]
        })
    );

    hub.notify(ReloadEvent::Reload);
    hub.notify(css("/c.css"));
    let polled = hub.wait_after(2, Duration::from_millis(10)).unwrap();
    assert_eq!(polled.event, Some(ReloadEvent::Reload));
    assert_eq!(polled.seq, 5);

    let only_latest = hub.wait_after(4, Duration::from_millis(10)).unwrap();
    assert_eq!(only_latest.event, Some(css("/c.css")));
}

#[test]
fn hub_sends_full_reload_to_clients_that_fell_behind() {
    let hub = ReloadHub::new();
    for _ in 0..40 {
        hub.notify(ReloadEvent::InjectCss {
            paths: vec!["/a.css".into()],
        });
    }
    let polled = hub.wait_after(1, Duration::from_millis(10)).unwrap();
    assert_eq!(polled.event, Some(ReloadEvent::Reload));
    assert_eq!(polled.seq, 40);
}

#[test]
fn hub_wakes_a_waiting_poller() {
    let hub = ReloadHub::new();
    let publisher = hub.clone();
    let waiter = thread::spawn(move || hub.wait_after(0, Duration::from_secs(5)));
    thread::sleep(Duration::from_millis(20));
    publisher.notify(ReloadEvent::Reload);

    let polled = waiter.join().unwrap().unwrap();
    assert_eq!(polled.event, Some(ReloadEvent::Reload));
}

#[test]
fn client_is_injected_before_the_last_body_close() {
    let tag = format!("<script src=\"{CLIENT_PATH}\"></script>");
    let html = "<body><pre></body></pre></BODY>";
    let out = String::from_utf8(inject_client(html.as_bytes())).unwrap();
    assert_eq!(out, format!("<body><pre></body></pre>{tag}</BODY>"));

    let bare = String::from_utf8(inject_client(b"<p>x</p>")).unwrap();
    assert_eq!(bare, format!("<p>x</p>{tag}"));
}

#[test]
fn decoding_and_content_types() {
    assert_eq!(percent_decode("/a%20b").as_deref(), Some("/a b"));
    assert_eq!(percent_decode("/%e2%9c%93").as_deref(), Some("/\u{2713}"));
    assert_eq!(percent_decode("/%ff"), None);
    assert_eq!(percent_decode("/%4"), None);

    assert_eq!(content_type_for(Path::new("x.PNG")), "image/png");
    assert_eq!(content_type_for(Path::new("x.woff2")), "font/woff2");
    assert_eq!(content_type_for(Path::new("x")), "application/octet-stream");
}

fn http(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn dev_server_answers_over_http() {
    let (router, _) = router();
    let server = DevServer::bind("127.0.0.1:0", router).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());

    let page = http(addr, "GET / HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert!(page.starts_with("HTTP/1.0 200") || page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.contains(CLIENT_PATH));

    let missing = http(addr, "GET /nope HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert!(missing.contains(" 404 "), "{missing}");

    let post = http(
        addr,
        "POST / HTTP/1.0\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    );
    assert!(post.contains(" 405 "), "{post}");
}

#[test]
fn polls_beyond_the_worker_pool_are_answered_at_once() {
    use sitedag::server::{POLL_BACKLOG, POLL_WORKERS};

    let (router, _hub) = router();
    let server = DevServer::bind("127.0.0.1:0", router).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());

    let request = format!("GET {POLL_PATH}?since=0 HTTP/1.0\r\nHost: localhost\r\n\r\n");

    // Nothing is published, so these all wait for the full poll timeout.
    let waiting: Vec<TcpStream> = (0..POLL_WORKERS + POLL_BACKLOG)
        .map(|_| {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(request.as_bytes()).unwrap();
            stream
        })
        .collect();
    thread::sleep(Duration::from_millis(300));

    let overflow = http(addr, &request);
    assert!(overflow.contains(" 200 "), "{overflow}");
    assert!(overflow.ends_with(r#"{"seq":0,"event":null}"#), "{overflow}");

    // Plain files are still served while every worker is busy.
    let page = http(addr, "GET / HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert!(page.contains(CLIENT_PATH));
    drop(waiting);
}
