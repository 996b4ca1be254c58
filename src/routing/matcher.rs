//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method (exact)
//! - Match request path (exact, query string ignored)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `AnyMatcher` is the explicit catch-all; it always matches
//! - No regex to guarantee O(n) matching

use axum::http::Method;

use crate::http::request::IncomingRequest;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &IncomingRequest) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        req.method == self.method
    }
}

/// Matches the request path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    /// Create a new exact path matcher.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        req.path() == self.path
    }
}

/// Matches every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyMatcher;

impl Matcher for AnyMatcher {
    fn matches(&self, _req: &IncomingRequest) -> bool {
        true
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// `METHOD path` matcher, the shape of every named route.
pub fn method_and_path(method: Method, path: &str) -> AndMatcher {
    AndMatcher::new(vec![
        Box::new(MethodMatcher::new(method)),
        Box::new(ExactPathMatcher::new(path)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Uri};

    fn request(method: Method, uri: &str) -> IncomingRequest {
        IncomingRequest {
            method,
            uri: uri.parse::<Uri>().unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_ip: None,
            edge: None,
        }
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new(Method::POST);
        assert!(matcher.matches(&request(Method::POST, "/pdf/load")));
        assert!(!matcher.matches(&request(Method::GET, "/pdf/load")));
    }

    #[test]
    fn test_exact_path_matcher() {
        let matcher = ExactPathMatcher::new("/pdf/load");

        assert!(matcher.matches(&request(Method::POST, "http://edge.example/pdf/load")));
        assert!(matcher.matches(&request(Method::POST, "/pdf/load?doc=1")));
        assert!(!matcher.matches(&request(Method::POST, "/pdf/load/")));
        assert!(!matcher.matches(&request(Method::POST, "/PDF/load")));
        assert!(!matcher.matches(&request(Method::POST, "/pdf/loader")));
    }

    #[test]
    fn test_and_matcher_requires_all() {
        let matcher = method_and_path(Method::POST, "/pdf/query");

        assert!(matcher.matches(&request(Method::POST, "/pdf/query")));
        assert!(!matcher.matches(&request(Method::GET, "/pdf/query")));
        assert!(!matcher.matches(&request(Method::POST, "/pdf/load")));
    }

    #[test]
    fn test_any_matcher() {
        assert!(AnyMatcher.matches(&request(Method::DELETE, "/anything?at=all")));
    }
}
