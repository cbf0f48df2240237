//! A loopback HTTP/1.1 server for exercising requests without the network.
//!
//! The server runs on its own thread and runtime, so it can serve both async
//! tests and blocking calls made outside of any runtime.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Notify};

use super::Client;

/// The API key every test client is built with.
pub(crate) const TEST_KEY: &'static str = "abc123";

pub(crate) enum Reply {
    /// A complete JSON document with the given status.
    Body { status: u16, body: String },
    /// A chunked 200 response. Each entry is written and flushed as its own
    /// chunk. With `hold_open` the response is never terminated and the
    /// server waits for the client to hang up.
    Stream { chunks: Vec<String>, hold_open: bool },
}

impl Reply {
    pub(crate) fn json(status: u16, body: &str) -> Reply {
        Reply::Body {
            status,
            body: body.to_string(),
        }
    }

    pub(crate) fn ndjson<S: AsRef<str>>(lines: &[S]) -> Reply {
        Reply::Stream {
            chunks: lines.iter().map(|l| format!("{}\n", l.as_ref())).collect(),
            hold_open: false,
        }
    }

    pub(crate) fn ndjson_held_open<S: AsRef<str>>(lines: &[S]) -> Reply {
        Reply::Stream {
            chunks: lines.iter().map(|l| format!("{}\n", l.as_ref())).collect(),
            hold_open: true,
        }
    }

    /// Raw body chunks, for streams whose line breaks straddle chunks.
    pub(crate) fn chunks(chunks: &[&str]) -> Reply {
        Reply::Stream {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            hold_open: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    requests: Mutex<Vec<RecordedRequest>>,
    hangups: AtomicUsize,
    hangup: Notify,
}

pub(crate) struct MockServer {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockServer {
    pub(crate) fn start(reply: Reply) -> MockServer {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        listener
            .set_nonblocking(true)
            .expect("failed to set the listener non-blocking");

        let addr = listener.local_addr().expect("listener has no address");

        let state = Arc::new(State::default());
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let thread_state = Arc::clone(&state);

        let thread = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build the server runtime");

            rt.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("failed to adopt listener");
                let reply = Arc::new(reply);

                let accept = async {
                    loop {
                        let Ok((socket, _)) = listener.accept().await else {
                            continue;
                        };

                        tokio::spawn(serve(
                            socket,
                            Arc::clone(&reply),
                            Arc::clone(&thread_state),
                        ));
                    }
                };

                tokio::select! {
                    _ = shutdown_rx => {}
                    _ = accept => {}
                }
            });
        });

        MockServer {
            addr,
            state,
            shutdown: Some(shutdown),
            thread: Some(thread),
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client pointed at this server, ignoring environment proxies.
    pub(crate) fn client(&self) -> Client {
        Client::builder(TEST_KEY)
            .api_base(self.base_url())
            .no_proxy()
            .build()
            .expect("failed to build a test client")
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of held-open streams whose client has hung up.
    pub(crate) fn hangups(&self) -> usize {
        self.state.hangups.load(Ordering::SeqCst)
    }

    /// Waits until a held-open stream's client hangs up.
    pub(crate) async fn wait_for_hangup(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.state.hangup.notified())
            .await
            .is_ok()
    }

    /// Blocking form of [`MockServer::wait_for_hangup`].
    pub(crate) fn wait_for_hangup_blocking(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;

        while std::time::Instant::now() < deadline {
            if self.hangups() > 0 {
                return true;
            }

            std::thread::sleep(Duration::from_millis(10));
        }

        self.hangups() > 0
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }

        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");

    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();

    while body.len() < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn serve(mut socket: TcpStream, reply: Arc<Reply>, state: Arc<State>) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    state.requests.lock().unwrap().push(request);

    match &*reply {
        Reply::Body { status, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                reason(*status),
                body.len(),
                body
            );

            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Stream { chunks, hold_open } => {
            let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n";

            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }

            for chunk in chunks.iter().filter(|c| !c.is_empty()) {
                let framed = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);

                if socket.write_all(framed.as_bytes()).await.is_err() {
                    break;
                }

                let _ = socket.flush().await;
            }

            if !*hold_open {
                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.shutdown().await;
                return;
            }

            let mut buf = [0u8; 256];

            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }

            state.hangups.fetch_add(1, Ordering::SeqCst);
            state.hangup.notify_one();
        }
    }
}
