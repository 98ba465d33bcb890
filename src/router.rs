//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Routing happens before
//! any middleware runs, so middleware sees the matched pattern.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use matchit::Router as MatchitRouter;

use crate::error::HandlerError;
use crate::handler::{self, BoxedHandler, Endpoint, ErrorHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// A registered handler together with the pattern it was registered under.
#[derive(Clone)]
struct Route {
    pattern: Arc<str>,
    handler: BoxedHandler,
}

/// The application router.
///
/// One radix tree per HTTP method. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve). Every builder method returns
/// `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
    middleware: Arc<[BoxedMiddleware]>,
    error_handler: ErrorHandler,
    not_found: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Arc::new([]),
            error_handler: Arc::new(handler::default_error_handler),
            not_found: handler::not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` or `:name` syntax; `req.param("name")`
    /// retrieves them. [`Request::route`] reports the path exactly as written
    /// here.
    ///
    /// ```rust,no_run
    /// # use astor_otel::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// # async fn delete_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/{id}", delete_user)
    ///     .on(Method::GET,    "/users/:id",  get_user)
    ///     .on(Method::POST,   "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for the same method.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let route = Route {
            pattern: Arc::from(path),
            handler: handler.into_boxed_handler(),
        };
        self.routes
            .entry(method)
            .or_default()
            .insert(matchit_path(path), route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Appends a middleware. The first one added is the outermost.
    ///
    /// Middleware wraps every request, including those that match no route.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut stack = self.middleware.to_vec();
        stack.push(Arc::new(middleware));
        self.middleware = stack.into();
        self
    }

    /// Replaces the error handler.
    ///
    /// Runs exactly once for every handler that returns `Err`, before the
    /// response travels back up through the middleware.
    pub fn error_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&HandlerError) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(f);
        self
    }

    /// Routes one request through the middleware chain and its handler.
    ///
    /// This is what the server calls per request; tests can call it directly.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let (head, body) = req.into_parts();

        let (handler, params, route) = match self.lookup(&head.method, head.uri.path()) {
            Some((route, params)) => (route.handler, params, Some(route.pattern)),
            None => (Arc::clone(&self.not_found), HashMap::new(), None),
        };

        let endpoint = Endpoint::new(handler, Arc::clone(&self.error_handler));
        let next = Next::new(Arc::clone(&self.middleware), endpoint);
        next.run(Request::new(head, body, params, route)).await
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Route, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Rewrites `:name` and `*name` segments into matchit's `{name}` and
/// `{*name}` forms. Paths already using braces pass through unchanged.
fn matchit_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
