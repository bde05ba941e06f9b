//! Request correlation middleware.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use common::{REQUEST_ID_HEADER, RequestContext};
use tracing::Instrument;

/// Attaches a [`RequestContext`] to every request.
///
/// The id comes from the `X-Request-Id` header or is generated. It is stored
/// in the request extensions for handlers, recorded on a span wrapping the
/// rest of the stack and echoed on the response.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::from_header(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    request.extensions_mut().insert(ctx.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(ctx.request_id().as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
