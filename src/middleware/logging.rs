use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const BODY_LIMIT: usize = 1024 * 1024;
const LOGGED_BODY_CHARS: usize = 2000;

/// Logs each request and response with a shared request id, echoed back in
/// `x-request-id`. An id supplied by the caller is reused.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    // Extract and log request body
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read request body: {}", e);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let request_body = String::from_utf8_lossy(&bytes);
    let truncated_request = truncate_body(&request_body, LOGGED_BODY_CHARS);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        body = %truncated_request,
        "→ Request"
    );

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let status = response.status();
    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read response body: {}", e);
            Bytes::new()
        }
    };

    let response_body = String::from_utf8_lossy(&bytes);
    let truncated_response = truncate_body(&response_body, LOGGED_BODY_CHARS);
    let latency = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        body = %truncated_response,
        "← Response"
    );

    let mut response = Response::from_parts(parts, Body::from(bytes));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Cut a body down to `max_chars` characters for the log line
fn truncate_body(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        None => body.to_string(),
        Some((cut, _)) => format!(
            "{}...[truncated, {} bytes total]",
            &body[..cut],
            body.len()
        ),
    }
}
