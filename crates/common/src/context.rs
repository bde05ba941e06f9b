//! Per-request correlation context.
//!
//! Every inbound request gets a [`RequestContext`]. It is passed explicitly
//! into service calls, recorded on their tracing spans and forwarded on
//! outbound calls so log lines of both services can be joined.

use uuid::Uuid;

/// Header carrying the correlation id between services.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an id received from a client.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context value threaded through every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: RequestId,
}

impl RequestContext {
    /// Creates a context with a freshly generated request id.
    pub fn new() -> Self {
        Self {
            request_id: RequestId::generate(),
        }
    }

    /// Creates a context from an incoming header value, generating an id
    /// when the header is missing or blank.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() => Self {
                request_id: RequestId::new(id),
            },
            _ => Self::new(),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
