use axum::{http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// Stamps each request with a trace id and logs its outcome inside a span
/// carrying that id.
pub async fn logger<B>(mut req: Request<B>, next: Next<B>) -> Response {
    let trace_id = Uuid::new_v4();
    req.extensions_mut().insert(trace_id);
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let span = info_span!("request", trace_id = %trace_id, method = %method, path = %path);
    let response = next.run(req).instrument(span).await;

    info!(
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request log"
    );
    response
}
