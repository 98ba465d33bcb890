//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};

/// Peer address of the connection a request arrived on.
///
/// The server inserts it into the request extensions; requests fed straight
/// to [`Router::handle`](crate::Router::handle) may carry one too.
#[derive(Clone, Copy, Debug)]
pub struct RemoteAddr(pub SocketAddr);

/// An incoming HTTP request with its body fully read and its route matched.
pub struct Request {
    head: Parts,
    body: Bytes,
    params: HashMap<String, String>,
    route: Option<Arc<str>>,
}

impl Request {
    pub(crate) fn new(
        head: Parts,
        body: Bytes,
        params: HashMap<String, String>,
        route: Option<Arc<str>>,
    ) -> Self {
        Self { head, body, params, route }
    }

    pub fn method(&self) -> &Method { &self.head.method }
    pub fn uri(&self) -> &Uri { &self.head.uri }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn query(&self) -> Option<&str> { self.head.uri.query() }
    pub fn version(&self) -> Version { self.head.version }
    pub fn headers(&self) -> &HeaderMap { &self.head.headers }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn extensions(&self) -> &Extensions { &self.head.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.head.extensions }

    /// Header lookup. Values that are not visible ASCII read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The route pattern this request matched, exactly as it was registered.
    ///
    /// `None` when no route matched and the request is on its way to a 404.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Address of the connected peer, when known.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.head.extensions.get::<RemoteAddr>().map(|addr| addr.0)
    }
}
