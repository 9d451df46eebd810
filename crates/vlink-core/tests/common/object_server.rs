//! Minimal HTTP/1.1 server that answers HEAD like an S3 endpoint for integration tests.
//!
//! Known object paths get `200 OK`, everything else `404 Not Found`. Every
//! request line and its headers are recorded so tests can inspect what the
//! client sent.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// If set, every request gets this status instead of 200/404.
    pub force_status: Option<u16>,
}

pub struct ObjectServer {
    pub endpoint: String,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// Starts a server in a background thread. `objects` are request paths such as
/// `/bucket/dir/file.zip`. The server runs until the process exits.
pub fn start(objects: &[&str]) -> ObjectServer {
    start_with_options(objects, ServerOptions::default())
}

pub fn start_with_options(objects: &[&str], opts: ServerOptions) -> ObjectServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects: Arc<HashSet<String>> = Arc::new(objects.iter().map(|s| s.to_string()).collect());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_server = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let objects = Arc::clone(&objects);
            let seen = Arc::clone(&seen_in_server);
            let opts = opts.clone();
            thread::spawn(move || handle(stream, &objects, &seen, &opts));
        }
    });
    ObjectServer {
        endpoint: format!("http://127.0.0.1:{}", port),
        seen,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    objects: &HashSet<String>,
    seen: &Mutex<Vec<SeenRequest>>,
    opts: &ServerOptions,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let req = parse_request(request);
    let status = match opts.force_status {
        Some(code) => code,
        None if !req.method.eq_ignore_ascii_case("HEAD") => 405,
        None if objects.contains(&req.path) => 200,
        None => 404,
    };
    if let Ok(mut seen) = seen.lock() {
        seen.push(req);
    }
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status, reason
    );
    let _ = stream.write_all(response.as_bytes());
}

fn parse_request(request: &str) -> SeenRequest {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    SeenRequest {
        method,
        path,
        headers,
    }
}
