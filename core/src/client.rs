//! The request engine: header composition, the redirect loop, and cache
//! coordination.
//!
//! # Design
//! `Client` owns its configuration, caller-set headers, target URI, and
//! redirect counter. `request` is blocking and sequential: every hop opens
//! one TCP connection, writes the request head, reads until the peer closes,
//! and drops the socket before the next hop starts. Header composition is a
//! pure function (`build_request`) so it can be checked without a network.
//!
//! Cache entries are keyed by the URI the caller asked for, not by the URI
//! the redirect chain ended on, so the next call for the same URI hits.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use serde_json::Value;
use url::Url;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::headers::{HeaderTable, HeaderValue};
use crate::http::{HttpMethod, HttpRequest, Response};

const DEFAULT_PORT: u16 = 80;

/// Blocking HTTP/1.1 client with redirect following and an optional disk
/// cache.
#[derive(Debug, Clone, Default)]
pub struct Client {
    uri: Option<String>,
    config: Config,
    headers: HeaderTable,
    redirect_count: u32,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uri = Some(uri.into());
        self
    }

    /// The current target. After a request that followed redirects this is
    /// the last URI fetched.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Merge `options` into the configuration. See [`Config::merge`].
    pub fn configure(&mut self, options: Value) -> Result<&mut Self> {
        self.config.merge(options)?;
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn unset_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        self
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    /// Redirects followed by the last networked `request`. A cache hit
    /// leaves this untouched.
    pub fn redirect_count(&self) -> u32 {
        self.redirect_count
    }

    pub fn get(&mut self) -> Result<Response> {
        self.request(HttpMethod::Get)
    }

    /// Issue `method` against the current URI, following redirects up to
    /// `max_redirects`.
    ///
    /// A fresh cache entry for the URI is returned without touching the
    /// network. Otherwise the final response of the redirect chain is
    /// written to the cache (when enabled) and returned. Reaching the
    /// redirect limit or meeting a `Location` that is not an absolute http
    /// URI is not an error: the response in hand is returned as final.
    pub fn request(&mut self, method: HttpMethod) -> Result<Response> {
        let requested = self.uri.clone().ok_or(Error::UnconfiguredTarget)?;

        let cache = CacheStore::from_config(&self.config);
        if let Some(bytes) = cache.as_ref().and_then(|c| c.try_read(&requested)) {
            return Ok(Response::from_bytes(bytes));
        }

        self.redirect_count = 0;
        let mut current = requested.clone();
        let response = loop {
            let target = RequestTarget::parse(&current)?;
            let request = self.build_request(method, &target);
            let response = Response::from_bytes(self.send(&target, &request)?);

            let Some(location) = redirect_location(&response) else {
                break response;
            };
            if self.redirect_count >= self.config.max_redirects {
                tracing::debug!(
                    limit = self.config.max_redirects,
                    location = %location,
                    "redirect limit reached"
                );
                break response;
            }

            tracing::debug!(from = %current, to = %location, status = response.status(), "following redirect");
            self.headers.remove("host");
            self.redirect_count += 1;
            self.uri = Some(location.clone());
            current = location;
        };

        if let Some(cache) = &cache {
            if let Err(e) = cache.write(&requested, response.raw()) {
                tracing::warn!(uri = %requested, error = %e, "failed to write cache entry");
            }
        }

        Ok(response)
    }

    /// Compose the request head for `target`.
    ///
    /// `Host`, `Connection: close` and `User-Agent` are injected only when
    /// the caller has not set them; caller headers follow in their own
    /// order, with list values comma-joined.
    pub fn build_request(&self, method: HttpMethod, target: &RequestTarget) -> HttpRequest {
        let mut headers = Vec::with_capacity(self.headers.len() + 3);

        if !self.headers.contains("host") {
            headers.push(("Host".to_string(), target.host_header()));
        }
        if !self.headers.contains("connection") {
            headers.push(("Connection".to_string(), "close".to_string()));
        }
        if !self.headers.contains("user-agent") {
            headers.push(("User-Agent".to_string(), self.config.user_agent.clone()));
        }
        for (name, value) in self.headers.iter() {
            headers.push((name.to_string(), value.joined()));
        }

        HttpRequest {
            method,
            target: target.path_and_query.clone(),
            headers,
        }
    }

    /// One round trip. The socket is dropped, and so closed, on every exit.
    fn send(&self, target: &RequestTarget, request: &HttpRequest) -> Result<Vec<u8>> {
        let mut stream = self.connect(target)?;
        let head = request.to_bytes();
        tracing::trace!(head = %String::from_utf8_lossy(&head), "sending request");
        stream.write_all(&head)?;
        stream.flush()?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;
        tracing::debug!(host = %target.host, port = target.port, bytes = raw.len(), "response read");
        Ok(raw)
    }

    fn connect(&self, target: &RequestTarget) -> Result<TcpStream> {
        let timeout = self.config.timeout();
        let connect_err = |source: io::Error| Error::Connect {
            host: target.host.clone(),
            port: target.port,
            source,
        };

        let addrs = (target.connect_host(), target.port)
            .to_socket_addrs()
            .map_err(connect_err)?;

        let mut last_err = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(timeout)?;
                    stream.set_write_timeout(timeout)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(connect_err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        })))
    }
}

/// The `Location` of a redirect response, if it is one we can follow.
/// Only the first `Location` line counts when the server sent several.
fn redirect_location(response: &Response) -> Option<String> {
    if !response.is_redirect() {
        return None;
    }
    let location = response
        .headers()
        .get("location")
        .and_then(HeaderValue::first)?
        .trim()
        .to_string();
    match RequestTarget::parse(&location) {
        Ok(_) => Some(location),
        Err(e) => {
            tracing::debug!(location = %location, error = %e, "not following redirect");
            None
        }
    }
}

/// An absolute http URI broken into what a socket and a request line need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// As it appears in a `Host` header; IPv6 literals keep their brackets.
    pub host: String,
    pub port: u16,
    pub path_and_query: String,
}

impl RequestTarget {
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidUri {
            uri: uri.to_string(),
            reason,
        };

        let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?;

        let mut path_and_query = match url.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        if let Some(query) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_PORT),
            path_and_query,
        })
    }

    /// `host`, with `:port` appended unless the port is 80.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn connect_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }
}
