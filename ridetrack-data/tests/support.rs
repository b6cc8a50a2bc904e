//! Local peers shared by the adapter integration tests.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;

/// Upper bound for every wait in the adapter tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Bind a listener on an ephemeral loopback port.
pub async fn loopback_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let address = listener.local_addr().expect("local address").to_string();
    (listener, address)
}

/// Answer exactly one HTTP request with `status` and a JSON `body`.
pub async fn serve_once(listener: TcpListener, status: &'static str, body: &'static str) {
    let (mut stream, _) = listener.accept().await.expect("accept request");
    let mut request = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await.expect("read request");
        if read == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..read]);
    }
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("write response");
    stream.shutdown().await.expect("close response");
}

/// Line reader over the accepted side of a channel connection.
pub struct Peer {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    _writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Peer {
    /// Accept the next connection on `listener`.
    pub async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
            .await
            .expect("connection within timeout")
            .expect("accept connection");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            _writer: writer,
        }
    }

    /// Next frame line, or `None` once the session closes its side.
    pub async fn next_line(&mut self) -> Option<String> {
        tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("line within timeout")
            .expect("read line")
    }

    /// Next line decoded as JSON.
    pub async fn next_frame(&mut self) -> serde_json::Value {
        let line = self.next_line().await.expect("frame before close");
        serde_json::from_str(&line).expect("frame is JSON")
    }
}
