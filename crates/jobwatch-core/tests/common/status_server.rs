//! Minimal HTTP/1.1 server for the import-job status endpoints.
//!
//! `GET .../status` answers with the next scripted poll response (the last one
//! repeats). `GET .../stream` plays the next scripted stream session as a
//! `text/event-stream` body and then closes the connection.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum StreamSession {
    /// Answer with this HTTP status and no body.
    Reject(u16),
    /// Send each payload as one event, then close (or hold the connection open).
    Frames { payloads: Vec<String>, hold_open: bool },
}

#[derive(Debug, Default)]
struct ServerState {
    poll_responses: VecDeque<(u16, String)>,
    last_poll: Option<(u16, String)>,
    stream_sessions: VecDeque<StreamSession>,
    poll_hits: usize,
    stream_hits: usize,
    poll_auth: Vec<Option<String>>,
    stream_targets: Vec<String>,
}

#[derive(Clone)]
pub struct StatusServer {
    pub base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl StatusServer {
    pub fn poll_hits(&self) -> usize {
        self.state.lock().unwrap().poll_hits
    }

    pub fn stream_hits(&self) -> usize {
        self.state.lock().unwrap().stream_hits
    }

    pub fn poll_auth(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().poll_auth.clone()
    }

    /// Request targets (path + query) of every stream request.
    pub fn stream_targets(&self) -> Vec<String> {
        self.state.lock().unwrap().stream_targets.clone()
    }
}

/// Status frame JSON as the backend sends it.
pub fn frame(status: &str, progress: u32) -> String {
    format!(r#"{{"status":"{status}","progress_percentage":{progress}}}"#)
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(poll: Vec<(u16, String)>, stream: Vec<StreamSession>) -> StatusServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(ServerState {
        poll_responses: poll.into(),
        stream_sessions: stream.into(),
        ..ServerState::default()
    }));
    let shared = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &state));
        }
    });
    StatusServer {
        base_url: format!("http://127.0.0.1:{}", port),
        state,
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<ServerState>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]).to_string();
    let (target, authorization) = parse_request(&request);
    let path = target.split('?').next().unwrap_or("");

    if path.ends_with("/status") {
        let (code, body) = {
            let mut s = state.lock().unwrap();
            s.poll_hits += 1;
            s.poll_auth.push(authorization);
            let next = s.poll_responses.pop_front().or_else(|| s.last_poll.clone());
            if let Some(ref r) = next {
                s.last_poll = Some(r.clone());
            }
            next.unwrap_or((404, String::new()))
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            code,
            reason(code),
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if path.ends_with("/stream") {
        let session = {
            let mut s = state.lock().unwrap();
            s.stream_hits += 1;
            s.stream_targets.push(target.clone());
            s.stream_sessions.pop_front()
        };
        match session {
            None => {
                let _ = stream.write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            }
            Some(StreamSession::Reject(code)) => {
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    code,
                    reason(code)
                );
                let _ = stream.write_all(response.as_bytes());
            }
            Some(StreamSession::Frames { payloads, hold_open }) => {
                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
                if stream.write_all(head.as_bytes()).is_err() {
                    return;
                }
                let _ = stream.write_all(b": connected\n\n");
                for payload in payloads {
                    thread::sleep(Duration::from_millis(10));
                    let event = format!("data: {}\n\n", payload);
                    if stream.write_all(event.as_bytes()).is_err() {
                        return;
                    }
                    let _ = stream.flush();
                }
                if hold_open {
                    thread::sleep(Duration::from_secs(5));
                }
            }
        }
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Returns (request target, Authorization header value).
fn parse_request(request: &str) -> (String, Option<String>) {
    let mut lines = request.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    let mut authorization = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }
    (target, authorization)
}
