//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Bodies are buffered
//! up to `MAX_BODY_BYTES` before routing.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::routes::{self, ApiRequest};
use crate::server::AppState;
use crate::types::TrackerError;

pub async fn run(state: Arc<AppState>) -> Result<(), TrackerError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Scholarship tracker listening on {} (storage: {}, mailer: {})",
        state.args.listen,
        state.repo.backend(),
        state.mailer.name()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use in production");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let mut response = match buffer_request(req, state.args.max_body_bytes).await {
        Ok(api_request) => routes::dispatch(api_request, &state).await,
        Err(err) => {
            warn!("[{}] {} {} rejected: {}", addr, method, path, err);
            routes::error_response(&err)
        }
    };

    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    Ok(response)
}

/// Collect the body, refusing anything over `limit` bytes
async fn buffer_request(req: Request<Incoming>, limit: usize) -> Result<ApiRequest, TrackerError> {
    let (parts, body) = req.into_parts();

    let body = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                TrackerError::PayloadTooLarge(format!("Request body exceeds {} bytes", limit))
            } else {
                TrackerError::BadRequest(format!("Failed to read request body: {}", e))
            }
        })?
        .to_bytes();

    Ok(ApiRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    })
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = routes::empty_response(StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("authorization, content-type, x-webhook-secret"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
    );
    headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
    response
}
