//! Networking primitives.
//!
//! Goals:
//! - Provide the request/response seam (`Transport`) the sync loop talks to.
//! - Provide a small HTTP/1.1 codec over tokio streams, shared by the client
//!   transport and the replay server.
//! - Keep framing explicit: one request per connection, `Connection: close`.
//!
//! This is not a general HTTP implementation; it speaks exactly what the
//! simulation server and the replay server need.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time,
};

use crate::{
    error::{FetchError, TransportError},
    snapshot::GameSnapshot,
};

/// Starts (or restarts) a simulation session.
pub const START_PATH: &str = "/start_game";
/// Returns the current snapshot.
pub const STATE_PATH: &str = "/game_state";
/// Advances the simulation by one step.
pub const STEP_PATH: &str = "/step";

/// Largest request head the server side will buffer.
const MAX_HEAD: usize = 16 * 1024;

/// The three calls the sync loop makes against the simulation.
#[async_trait]
pub trait Transport: Send {
    /// Starts a session. The acknowledgment body is returned as-is.
    async fn start_session(&mut self) -> Result<String, TransportError>;
    /// Fetches and decodes the current snapshot.
    async fn fetch_snapshot(&mut self) -> Result<GameSnapshot, FetchError>;
    /// Requests one simulation step.
    async fn advance_step(&mut self) -> Result<String, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

/// `http://host[:port][/base]` split into a connect address and path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl ServerUrl {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidUrl(url.to_string());
        let rest = url.trim().strip_prefix("http://").ok_or_else(invalid)?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(invalid());
        }
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => (h, p.parse().map_err(|_| invalid())?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            host: host.to_string(),
            port,
            base_path: path.trim_end_matches('/').to_string(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            self.addr()
        }
    }

    pub fn path(&self, route: &str) -> String {
        format!("{}{}", self.base_path, route)
    }
}

/// A parsed request (server side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

/// A parsed response (client side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turns non-2xx answers into `TransportError::Status`.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: self.body_text(),
            })
        }
    }
}

/// Serializes a request with an empty or JSON body.
pub fn encode_request(url: &ServerUrl, method: Method, route: &str, body: &[u8]) -> Bytes {
    let head = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        method.as_str(),
        url.path(route),
        url.host_header(),
        body.len(),
    );
    let mut buf = BytesMut::with_capacity(head.len() + body.len());
    buf.put_slice(head.as_bytes());
    buf.put_slice(body);
    buf.freeze()
}

/// Serializes a JSON response.
pub fn encode_response(status: u16, body: &[u8]) -> Bytes {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        body.len(),
    );
    let mut buf = BytesMut::with_capacity(head.len() + body.len());
    buf.put_slice(head.as_bytes());
    buf.put_slice(body);
    buf.freeze()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parses a complete response read until the peer closed the connection.
pub fn parse_response(raw: &[u8]) -> Result<HttpResponse, TransportError> {
    let malformed = |what: &str| TransportError::MalformedResponse(what.to_string());

    let head_end = find_head_end(raw).ok_or_else(|| malformed("missing header terminator"))?;
    let head = std::str::from_utf8(&raw[..head_end]).map_err(|_| malformed("non-utf8 head"))?;
    let rest = &raw[head_end + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or_else(|| malformed("empty head"))?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(malformed("not an HTTP/1.x status line"));
    }
    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| malformed("bad status code"))?;

    let mut headers = Vec::new();
    for line in lines {
        let (k, v) = line
            .split_once(':')
            .ok_or_else(|| malformed("bad header line"))?;
        headers.push((k.trim().to_string(), v.trim().to_string()));
    }

    let mut response = HttpResponse {
        status,
        headers,
        body: Bytes::new(),
    };

    let chunked = response
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let body = if chunked {
        decode_chunked(rest)?
    } else if let Some(len) = response.header("content-length") {
        let len: usize = len.parse().map_err(|_| malformed("bad content-length"))?;
        if rest.len() < len {
            return Err(malformed("truncated body"));
        }
        Bytes::copy_from_slice(&rest[..len])
    } else {
        Bytes::copy_from_slice(rest)
    };
    response.body = body;
    Ok(response)
}

fn decode_chunked(mut raw: &[u8]) -> Result<Bytes, TransportError> {
    let malformed = |what: &str| TransportError::MalformedResponse(what.to_string());
    let mut out = BytesMut::new();
    loop {
        let line_end = raw
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| malformed("unterminated chunk size"))?;
        let size_line = std::str::from_utf8(&raw[..line_end]).map_err(|_| malformed("chunk size"))?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed("chunk size"))?;
        raw = &raw[line_end + 2..];
        if size == 0 {
            return Ok(out.freeze());
        }
        let (data, rest) = match size.checked_add(2) {
            Some(end) if raw.len() >= end => raw.split_at(size),
            _ => return Err(malformed("truncated chunk")),
        };
        if !rest.starts_with(b"\r\n") {
            return Err(malformed("chunk not followed by CRLF"));
        }
        out.put_slice(data);
        raw = &rest[2..];
    }
}

/// Sends one request and reads the whole response.
pub async fn send_request(
    url: &ServerUrl,
    method: Method,
    route: &str,
    timeout: Duration,
) -> Result<HttpResponse, TransportError> {
    let exchange = async {
        let addr = url.addr();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect { addr, source })?;
        stream
            .write_all(&encode_request(url, method, route, &[]))
            .await?;
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        parse_response(&raw)
    };
    time::timeout(timeout, exchange)
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
}

/// Reads one request head plus its `Content-Length` body.
pub async fn read_request<S>(stream: &mut S) -> anyhow::Result<HttpRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);
    let head_end = loop {
        if let Some(end) = find_head_end(&buf) {
            break end;
        }
        if buf.len() > MAX_HEAD {
            anyhow::bail!("request head exceeds {MAX_HEAD} bytes");
        }
        let n = stream.read_buf(&mut buf).await?;
        if n == 0 {
            anyhow::bail!("connection closed before request head");
        }
    };

    let head = std::str::from_utf8(&buf[..head_end])?.to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let method = parts
        .next()
        .and_then(Method::parse)
        .ok_or_else(|| anyhow::anyhow!("unsupported request line {request_line:?}"))?;
    let path = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("request line without path"))?
        .to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            if k.trim().eq_ignore_ascii_case("content-length") {
                content_length = v.trim().parse()?;
            }
        }
    }

    let body_start = head_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read_buf(&mut buf).await?;
        if n == 0 {
            anyhow::bail!("connection closed mid-body");
        }
    }
    let body = buf.split_off(body_start).freeze().slice(..content_length);

    Ok(HttpRequest { method, path, body })
}

/// Writes a JSON response and shuts the write half down.
pub async fn write_response<S>(stream: &mut S, status: u16, body: &[u8]) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&encode_response(status, body)).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parsing() {
        let url = ServerUrl::parse("http://localhost:5000").unwrap();
        assert_eq!(url.addr(), "localhost:5000");
        assert_eq!(url.path(STATE_PATH), "/game_state");

        let url = ServerUrl::parse("http://sim.local/api/").unwrap();
        assert_eq!(url.port, 80);
        assert_eq!(url.path(STEP_PATH), "/api/step");

        assert!(ServerUrl::parse("https://x").is_err());
        assert!(ServerUrl::parse("http://").is_err());
        assert!(ServerUrl::parse("http://host:port").is_err());
    }

    #[test]
    fn request_encoding() {
        let url = ServerUrl::parse("http://127.0.0.1:5000").unwrap();
        let raw = encode_request(&url, Method::Post, START_PATH, &[]);
        let text = std::str::from_utf8(&raw).unwrap();
        assert!(text.starts_with("POST /start_game HTTP/1.1\r\n"));
        assert!(text.contains("Host: 127.0.0.1:5000\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn parses_content_length_response() {
        let raw = encode_response(200, br#"{"message":"ok"}"#);
        let resp = parse_response(&raw).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(&resp.body[..], br#"{"message":"ok"}"#);
    }

    #[test]
    fn parses_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        let resp = parse_response(raw).unwrap();
        assert_eq!(&resp.body[..], b"hello world");
    }

    #[test]
    fn rejects_oversized_and_unterminated_chunks() {
        let huge = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nab\r\n0\r\n\r\n";
        assert!(matches!(
            parse_response(huge),
            Err(TransportError::MalformedResponse(_))
        ));

        let no_crlf = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabXY0\r\n\r\n";
        assert!(matches!(
            parse_response(no_crlf),
            Err(TransportError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parses_close_delimited_response() {
        let raw = b"HTTP/1.0 200 OK\r\nServer: Werkzeug\r\n\r\n{}";
        let resp = parse_response(raw).unwrap();
        assert_eq!(&resp.body[..], b"{}");
    }

    #[test]
    fn non_success_status_becomes_error() {
        let raw = encode_response(400, br#"{"error": "No game in progress"}"#);
        let err = parse_response(&raw).unwrap().error_for_status().unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("No game in progress"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_response(b"garbage").is_err());
        assert!(parse_response(b"SPDY 200\r\n\r\n").is_err());
        assert!(parse_response(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc").is_err());
    }

    #[tokio::test]
    async fn reads_request_from_stream() {
        let raw: &[u8] = b"POST /step HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\n{}";
        let mut reader = raw;
        let req = read_request(&mut reader).await.unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/step");
        assert_eq!(&req.body[..], b"{}");
    }
}
