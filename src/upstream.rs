use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{DEV_USER_ID_HEADER, DEV_USER_ROLE_HEADER};

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::CONTENT_LENGTH);
}

/// UpstreamClient
///
/// Relays requests the guard let through to the front-end server and hands its
/// response back unchanged. Upstream redirects are returned to the client, not followed.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    max_body_bytes: usize,
}

/// UpstreamState
///
/// Shared handle on the upstream client held in the application state.
pub type UpstreamState = Arc<UpstreamClient>;

impl UpstreamClient {
    pub fn new(base_url: &str, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// forward
    ///
    /// Sends method, path, query, headers and body upstream and streams the response
    /// back. Failures to reach the upstream become `502`; bodies over the configured
    /// limit become `413`, other unreadable bodies `400`.
    pub async fn forward(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) if e.source().is_some_and(|source| source.is::<LengthLimitError>()) => {
                tracing::warn!("Rejecting request body for {}: {}", path_and_query, e);
                return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
            }
            Err(e) => {
                tracing::warn!("Request body for {} could not be read: {}", path_and_query, e);
                return (StatusCode::BAD_REQUEST, "request body unreadable").into_response();
            }
        };

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        // Identity claims from the development bypass never reach the front end.
        headers.remove(DEV_USER_ID_HEADER);
        headers.remove(DEV_USER_ROLE_HEADER);

        let upstream = match self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(bytes)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Upstream request to {} failed: {:?}", url, e);
                return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
            }
        };

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        response
    }
}
