use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::debug;

const TRACE_ID_HEADER: &str = "x-trace-id";

/**
 * Logs method, path, status and elapsed time of every request under the `performance` target.
 *
 * A `X-Trace-ID` header sent by the client is echoed on the response.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = std::time::Instant::now();
    let path = request.path().to_owned();
    let method = request.method().to_owned();
    let trace_id: Option<HeaderValue> = request.headers().get(TRACE_ID_HEADER).cloned();
    let mut response = next.call(request).await;
    let response_code = match &response {
        Ok(service_response) => service_response.status().as_u16(),
        Err(err) => err.as_response_error().status_code().as_u16(),
    };
    if let (Ok(service_response), Some(trace_id)) = (&mut response, trace_id) {
        service_response.headers_mut().insert(HeaderName::from_static(TRACE_ID_HEADER), trace_id);
    }
    debug!(target: "performance", "Request for {} {} with status {} processed in {}ms", method, path, response_code, start_time.elapsed().as_millis());
    response
}
