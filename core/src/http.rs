//! HTTP wire types: the request method, the composed request head, and the
//! parsed response.
//!
//! # Design
//! `HttpRequest` is plain data produced by the engine before any socket is
//! opened, so header composition is testable without the network.
//! `Response` parses whatever bytes came off the wire (or out of the cache)
//! and never fails: input that does not look like HTTP degrades to a
//! response with status 0, no headers, and the raw bytes as its body.

use std::fmt;
use std::str::FromStr;

use crate::headers::{HeaderTable, HeaderValue};

const INITIAL_HEADER_SLOTS: usize = 64;
/// Past this many headers a response is treated as unparseable.
const MAX_HEADER_SLOTS: usize = 8192;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// A request head ready to be written to a socket. No body is ever sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Origin-form target: path plus optional `?query`.
    pub target: String,
    /// Header lines in wire order; list values are already comma-joined.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Serialize the request line, headers, and blank-line terminator.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} HTTP/1.1\r\n", self.method, self.target);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.into_bytes()
    }

    /// Count of header lines whose name matches `name` case-insensitively.
    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed HTTP response that keeps the exact bytes it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    reason: String,
    version: String,
    headers: HeaderTable,
    body: Vec<u8>,
    raw: Vec<u8>,
}

impl Response {
    /// Parse a raw response stream. Leading 1xx interim responses such as
    /// `100 Continue` are skipped. Never fails.
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        let mut offset = 0;
        loop {
            match parse_head(&raw[offset..]) {
                // an interim response with nothing after it is all we have
                Some(head)
                    if (100..200).contains(&head.status) && offset + head.len < raw.len() =>
                {
                    offset += head.len;
                }
                Some(head) => {
                    let body = raw[offset + head.len..].to_vec();
                    return Self {
                        status: head.status,
                        reason: head.reason,
                        version: head.version,
                        headers: head.headers,
                        body,
                        raw,
                    };
                }
                None => return Self::unrecognized(raw),
            }
        }
    }

    fn unrecognized(raw: Vec<u8>) -> Self {
        Self {
            status: 0,
            reason: String::new(),
            version: String::new(),
            headers: HeaderTable::new(),
            body: raw.clone(),
            raw,
        }
    }

    /// Status code, or 0 if the input had no recognizable status line.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// e.g. `HTTP/1.1`; empty for unrecognized input.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    /// Case-insensitive lookup; repeated headers come back comma-joined.
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(HeaderValue::joined)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The bytes this response was parsed from, as written to the cache.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.status)
    }
}

struct Head {
    status: u16,
    reason: String,
    version: String,
    headers: HeaderTable,
    len: usize,
}

fn parse_head(buf: &[u8]) -> Option<Head> {
    let mut capacity = INITIAL_HEADER_SLOTS;
    loop {
        let mut slots = vec![httparse::EMPTY_HEADER; capacity];
        match parse_head_into(buf, &mut slots) {
            Err(httparse::Error::TooManyHeaders) if capacity < MAX_HEADER_SLOTS => {
                capacity *= 2;
            }
            Ok(head) => return head,
            Err(_) => return None,
        }
    }
}

/// `Ok(None)` when the head is incomplete.
fn parse_head_into<'b>(
    buf: &'b [u8],
    slots: &mut [httparse::Header<'b>],
) -> Result<Option<Head>, httparse::Error> {
    let mut parsed = httparse::Response::new(slots);
    let len = match parsed.parse(buf)? {
        httparse::Status::Complete(len) => len,
        httparse::Status::Partial => return Ok(None),
    };

    let mut headers = HeaderTable::new();
    for header in parsed.headers.iter() {
        headers.append(header.name, String::from_utf8_lossy(header.value).trim());
    }

    let Some(status) = parsed.code else {
        return Ok(None);
    };
    Ok(Some(Head {
        status,
        reason: parsed.reason.unwrap_or_default().to_string(),
        version: format!("HTTP/1.{}", parsed.version.unwrap_or(1)),
        headers,
        len,
    }))
}
